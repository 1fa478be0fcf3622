use rand::seq::SliceRandom;

const THINKING_MESSAGES: &[&str] = &[
    "Checking the skies",
    "Reading the barometer",
    "Consulting the clouds",
    "Sniffing the wind",
    "Counting raindrops",
    "Watching the horizon",
    "Tapping the weather glass",
    "Chasing a cold front",
    "Scanning the radar",
    "Asking the crows",
    "Measuring the dew point",
    "Following the jet stream",
];

pub fn get_random_thinking_message() -> &'static str {
    THINKING_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Thinking")
}
