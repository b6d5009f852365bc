//! Built-in scenario catalogue, used when the config defines none.

use pa_domain::config::Config;
use pa_domain::scenario::Scenario;

fn scenario(
    id: &str,
    name: &str,
    description: &str,
    system_prompt: &str,
    initial_message: &str,
    estimated_minutes: u32,
) -> Scenario {
    Scenario {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        system_prompt: system_prompt.into(),
        initial_message: Some(initial_message.into()),
        estimated_minutes: Some(estimated_minutes),
    }
}

pub fn builtin() -> Vec<Scenario> {
    vec![
        scenario(
            "coffee-shop",
            "Coffee Shop",
            "Order a drink and a snack at a busy café.",
            "You are a friendly barista at a neighbourhood coffee shop. Keep replies \
             short and conversational, one or two sentences. Ask about size, milk \
             and extras the way a real barista would.",
            "Good morning! What can I get you?",
            10,
        ),
        scenario(
            "job-interview",
            "Job Interview",
            "A first-round interview for a role you want.",
            "You are a hiring manager running a first-round interview. Ask one \
             question at a time, follow up on the candidate's answers, and keep a \
             professional but warm tone.",
            "Thanks for coming in today. Could you start by telling me a little about yourself?",
            15,
        ),
        scenario(
            "restaurant",
            "Restaurant",
            "Order dinner and ask about the menu.",
            "You are a waiter at a casual restaurant. Take the order, answer \
             questions about dishes, and suggest drinks. Keep replies brief.",
            "Good evening, welcome! Have you had a chance to look at the menu?",
            10,
        ),
        scenario(
            "hotel-check-in",
            "Hotel Check-In",
            "Check in at a hotel front desk.",
            "You are a hotel receptionist checking a guest in. Confirm the \
             reservation, ask for identification, and explain breakfast times and \
             Wi-Fi. Keep replies short and polite.",
            "Good afternoon and welcome. Do you have a reservation with us?",
            8,
        ),
        scenario(
            "doctor-visit",
            "Doctor Visit",
            "Describe symptoms to a family doctor.",
            "You are a calm, attentive family doctor. Ask about symptoms one at a \
             time, show empathy, and give simple general advice. Do not give \
             definitive diagnoses.",
            "Hello, come on in and have a seat. What brings you in today?",
            12,
        ),
    ]
}

/// Scenarios from the config, or the built-in set when it lists none.
pub fn catalogue(config: &Config) -> Vec<Scenario> {
    if config.scenarios.is_empty() {
        builtin()
    } else {
        config.scenarios.clone()
    }
}

pub fn find<'a>(scenarios: &'a [Scenario], id: &str) -> Option<&'a Scenario> {
    scenarios
        .iter()
        .find(|s| s.id == id || s.normalized_name() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pa_conversation::fallback::replies_for;

    #[test]
    fn builtin_ids_are_unique_and_have_canned_replies() {
        let all = builtin();
        let default = replies_for("");
        for (i, s) in all.iter().enumerate() {
            assert_eq!(s.id, s.normalized_name());
            assert!(all[i + 1..].iter().all(|o| o.id != s.id));
            assert_ne!(replies_for(&s.name), default, "{}", s.name);
        }
    }

    #[test]
    fn config_scenarios_replace_builtin() {
        let mut config = Config::default();
        assert_eq!(catalogue(&config).len(), 5);

        config.scenarios.push(Scenario {
            id: "museum".into(),
            name: "Museum Tour".into(),
            description: String::new(),
            system_prompt: "You are a tour guide.".into(),
            initial_message: None,
            estimated_minutes: None,
        });
        let list = catalogue(&config);
        assert_eq!(list.len(), 1);
        assert!(find(&list, "museum-tour").is_some());
        assert!(find(&list, "coffee-shop").is_none());
    }
}
