//! Message personalization
//!
//! Recognized placeholders are `{first_name}`, `{last_name}`, `{city}` and
//! `{phone_number}`. Anything else in braces is copied through untouched.
//! Substitution is a single left-to-right pass, so a field value that itself
//! looks like a placeholder is never expanded again.

use dialer_core::models::Contact;

/// Placeholder names understood by [`personalize`]
pub const PLACEHOLDERS: [&str; 4] = ["first_name", "last_name", "city", "phone_number"];

fn field<'a>(contact: &'a Contact, name: &str) -> Option<&'a str> {
    match name {
        "first_name" => Some(&contact.first_name),
        "last_name" => Some(&contact.last_name),
        "city" => Some(&contact.city),
        "phone_number" => Some(&contact.phone_number),
        _ => None,
    }
}

/// Render `template` for `contact`
pub fn personalize(template: &str, contact: &Contact) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let value = tail
            .find('}')
            .and_then(|close| field(contact, &tail[1..close]).map(|v| (v, close)));

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Contact {
        Contact {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            city: "London".to_string(),
            phone_number: "+441234".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_placeholders_are_replaced() {
        let message = personalize(
            "Hi {first_name} {last_name} from {city}, we will call {phone_number}.",
            &ada(),
        );

        assert_eq!(message, "Hi Ada Lovelace from London, we will call +441234.");
        for name in PLACEHOLDERS {
            assert!(!message.contains(&format!("{{{}}}", name)));
        }
    }

    #[test]
    fn test_repeated_placeholder() {
        assert_eq!(personalize("{first_name}, {first_name}!", &ada()), "Ada, Ada!");
    }

    #[test]
    fn test_unknown_and_unbalanced_braces_are_kept() {
        assert_eq!(
            personalize("{greeting} {first_name} {", &ada()),
            "{greeting} Ada {"
        );
        assert_eq!(personalize("{{first_name}}", &ada()), "{Ada}");
        assert_eq!(personalize("no placeholders", &ada()), "no placeholders");
    }

    #[test]
    fn test_empty_fields_substitute_empty() {
        let contact = Contact {
            first_name: "Bob".to_string(),
            ..Default::default()
        };
        assert_eq!(personalize("Hi {first_name} of {city}.", &contact), "Hi Bob of .");
    }

    #[test]
    fn test_values_are_not_expanded_twice() {
        let contact = Contact {
            first_name: "{city}".to_string(),
            city: "Paris".to_string(),
            ..Default::default()
        };
        assert_eq!(personalize("{first_name} / {city}", &contact), "{city} / Paris");
    }

    #[test]
    fn test_multibyte_text_around_placeholders() {
        assert_eq!(
            personalize("¡Hola {first_name}! ☎ {city}", &ada()),
            "¡Hola Ada! ☎ London"
        );
    }
}
