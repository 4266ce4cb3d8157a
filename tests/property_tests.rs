/// Property-based tests using proptest
/// Tests invariants of form progress and phone normalization
use cuidarte_leads::form::{clean_phone, normalize_phone, FieldValue, FormField, FormState};
use proptest::prelude::*;

/// Value that fills each required field.
fn filled_value(field: FormField) -> FieldValue {
    match field {
        FormField::Name => "Ana".into(),
        FormField::Email => "ana@example.com".into(),
        FormField::Phone => "600000000".into(),
        FormField::Country => "Chile".into(),
        FormField::Age => "35-45".into(),
        FormField::Sex => "Hombre".into(),
        FormField::Situation => "Estoy en tratamiento actualmente".into(),
        FormField::Interest => "Interesado/a con dudas".into(),
        FormField::Consent => true.into(),
        FormField::OtherCountry | FormField::CountryCode => "".into(),
    }
}

/// Form with every required field empty, including country.
fn blank_form() -> FormState {
    let mut form = FormState::default();
    form.update_field(FormField::Country, "".into()).unwrap();
    form
}

const REQUIRED: [FormField; 9] = cuidarte_leads::form::REQUIRED_FIELDS;

proptest! {
    #[test]
    fn progress_is_filled_over_nine(mask in proptest::collection::vec(any::<bool>(), 9)) {
        let mut form = blank_form();
        let mut filled = 0usize;
        for (field, on) in REQUIRED.iter().zip(&mask) {
            if *on {
                form.update_field(*field, filled_value(*field)).unwrap();
                filled += 1;
            }
        }
        let expected = 100.0 * filled as f64 / 9.0;
        prop_assert!((form.progress() - expected).abs() < 1e-9);
    }

    #[test]
    fn progress_never_decreases_while_filling(order in Just(REQUIRED.to_vec()).prop_shuffle()) {
        let mut form = blank_form();
        let mut last = form.progress();
        prop_assert_eq!(last, 0.0);
        for field in order {
            form.update_field(field, filled_value(field)).unwrap();
            let now = form.progress();
            prop_assert!(now >= last);
            last = now;
        }
        prop_assert_eq!(last, 100.0);
    }

    #[test]
    fn cleaned_phone_has_no_separators(raw in "[0-9 ()\\-]{0,20}") {
        let cleaned = clean_phone(&raw);
        prop_assert!(cleaned.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn normalization_is_idempotent(dial in "\\+[0-9]{1,3}", local in "[0-9 \\-]{0,15}") {
        let once = normalize_phone(&dial, &local);
        prop_assert_eq!(normalize_phone("", &once), once.clone());
        prop_assert!(once.starts_with(&dial));
    }
}

#[test]
fn known_phone_normalization() {
    assert_eq!(normalize_phone("+34", "600-000-000"), "+34600000000");
    assert_eq!(normalize_phone("", "+34600000000"), "+34600000000");
}
