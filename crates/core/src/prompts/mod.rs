use crate::emotion::Emotion;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Writing prompts tailored to the detected emotion. The match is exhaustive
/// over the closed category set; callers with a raw label go through
/// [`Emotion::from_label_lossy`] first.
pub fn prompt_bank(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => &[
            "What's bringing you joy today? Let's capture this positive moment...",
            "You seem bright today! What would you like to celebrate or remember?",
            "There's positive energy around you. What's going well in your life right now?",
            "Your happiness is showing! What experience or thought is lifting your spirits?",
        ],
        Emotion::Sad => &[
            "It looks like something is weighing on your heart. What would you like to share?",
            "Sometimes writing helps lighten emotional burdens. What's on your mind?",
            "I notice you might be feeling down. Would you like to explore what's happening?",
            "Your feelings are valid. What's making this moment difficult for you?",
        ],
        Emotion::Angry => &[
            "I can sense some tension. What's frustrating you right now?",
            "Strong emotions often carry important messages. What's triggering this feeling?",
            "It's okay to feel angry. What situation or thought is bothering you?",
            "Sometimes writing helps process intense feelings. What's stirring this energy in you?",
        ],
        Emotion::Surprise => &[
            "You look surprised! What unexpected thing just happened or crossed your mind?",
            "Something seems to have caught your attention. What's the surprising moment about?",
            "Life has a way of surprising us. What's the unexpected element you're processing?",
            "Your expression suggests something unexpected. What's this new development?",
        ],
        Emotion::Fear => &[
            "I notice some apprehension. What's making you feel uncertain right now?",
            "Fear often points to something important to us. What's causing this worry?",
            "It's natural to feel anxious sometimes. What's creating this unease?",
            "You seem concerned about something. What thoughts are making you feel unsettled?",
        ],
        Emotion::Disgust => &[
            "Something seems to be bothering you. What's creating this negative reaction?",
            "You look like something doesn't sit right with you. What's the source of this feeling?",
            "Sometimes we encounter things that don't align with our values. What's troubling you?",
            "I can see something has put you off. What's causing this strong reaction?",
        ],
        Emotion::Neutral => &[
            "How are you feeling in this moment? What's present for you right now?",
            "Sometimes the quiet moments are perfect for reflection. What's on your mind?",
            "You seem calm and centered. What would you like to explore or share today?",
            "This feels like a good moment for some gentle self-reflection. What's stirring within you?",
        ],
    }
}

/// Picks one prompt at random for the given emotion.
pub fn writing_prompt<R: Rng + ?Sized>(emotion: Emotion, rng: &mut R) -> &'static str {
    let bank = prompt_bank(emotion);
    bank.choose(rng).copied().unwrap_or(bank[0])
}

/// [`writing_prompt`] with the thread-local generator.
pub fn random_writing_prompt(emotion: Emotion) -> &'static str {
    writing_prompt(emotion, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::ALL_EMOTIONS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_emotion_has_prompts() {
        for emotion in ALL_EMOTIONS {
            assert!(!prompt_bank(emotion).is_empty());
        }
    }

    #[test]
    fn selected_prompt_comes_from_the_matching_bank() {
        let mut rng = StdRng::seed_from_u64(11);
        for emotion in ALL_EMOTIONS {
            let prompt = writing_prompt(emotion, &mut rng);
            assert!(prompt_bank(emotion).contains(&prompt));
        }
    }

    #[test]
    fn unknown_label_falls_back_to_neutral_bank() {
        let mut rng = StdRng::seed_from_u64(3);
        let emotion = crate::emotion::Emotion::from_label_lossy("bewildered");
        let prompt = writing_prompt(emotion, &mut rng);
        assert!(prompt_bank(crate::emotion::Emotion::Neutral).contains(&prompt));
    }
}
