//! Canned replies used when generation is unavailable.
//!
//! Lists are keyed by normalized scenario name. The reply for a turn is
//! picked by user-turn count and sticks to the last entry once exhausted,
//! so the same conversation always degrades the same way.

use pa_domain::scenario::normalize_name;

const COFFEE_SHOP: &[&str] = &[
    "Sure thing! What size would you like?",
    "Great choice. Would you like anything else with that?",
    "Alright, your total comes to $4.50. Will that be cash or card?",
    "Here you go! Have a wonderful day.",
];

const JOB_INTERVIEW: &[&str] = &[
    "Thanks for coming in today. Could you tell me a little about yourself?",
    "Interesting. What would you say is your greatest strength?",
    "Can you describe a challenge you faced at work and how you handled it?",
    "Why are you interested in this position?",
    "Thank you, that's very helpful. Do you have any questions for me?",
];

const RESTAURANT: &[&str] = &[
    "Welcome! Can I start you off with something to drink?",
    "Are you ready to order, or do you need a few more minutes?",
    "Excellent choice. How would you like that cooked?",
    "Can I get you anything else? Perhaps some dessert?",
    "Here's your check. Thank you for dining with us!",
];

const HOTEL_CHECK_IN: &[&str] = &[
    "Good evening! Do you have a reservation with us?",
    "Could I see your ID and the card you'd like to use, please?",
    "You're in room 412 on the fourth floor. Breakfast is served from 7 to 10.",
    "Is there anything else I can help you with during your stay?",
    "Enjoy your stay! Let us know if you need anything.",
];

const DOCTOR_VISIT: &[&str] = &[
    "Hello, what brings you in today?",
    "How long have you been feeling this way?",
    "Have you taken any medication for it so far?",
    "I'd recommend plenty of rest and fluids. Let's check back in a week.",
    "Take care, and don't hesitate to call if things get worse.",
];

const DEFAULT: &[&str] = &[
    "That's interesting! Tell me more.",
    "I see. What would you like to do next?",
    "Could you say a bit more about that?",
    "Got it. Is there anything else?",
    "Thanks for chatting with me!",
];

/// The canned list for a scenario name, or the generic default.
pub fn replies_for(scenario_name: &str) -> &'static [&'static str] {
    match normalize_name(scenario_name).as_str() {
        "coffee-shop" => COFFEE_SHOP,
        "job-interview" => JOB_INTERVIEW,
        "restaurant" => RESTAURANT,
        "hotel-check-in" => HOTEL_CHECK_IN,
        "doctor-visit" => DOCTOR_VISIT,
        _ => DEFAULT,
    }
}

/// Reply for the `user_turns`-th user message (1-based).
pub fn canned_reply(scenario_name: &str, user_turns: usize) -> &'static str {
    let replies = replies_for(scenario_name);
    let index = user_turns.saturating_sub(1).min(replies.len() - 1);
    replies[index]
}
