use shortname_gen::core::dictionary::{AbbreviationDictionary, DuplicatePolicy};
use shortname_gen::{MessageKind, ShortNameError, ShortNameProcessor, MAX_SHORT_NAME_LENGTH};
use tempfile::TempDir;

const REFERENCE: &str = "Solution Dextrose 5% 500 milliliters Bottle Viaflex Non-Latex";

fn processor_with_dictionary(csv: &str) -> (ShortNameProcessor, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("abbreviations.csv");
    std::fs::write(&path, csv).unwrap();

    let processor = ShortNameProcessor::with_defaults().unwrap();
    processor.load_dictionary(&path).unwrap();
    (processor, temp_dir)
}

#[test]
fn test_reference_description_end_to_end() {
    let (processor, _dir) = processor_with_dictionary(
        "Full Term,Abbreviation\nSolution,Sol\nDextrose,Dex\nBottle,Btl\n",
    );

    let result = processor.process_full_description(REFERENCE).unwrap();
    assert!(result.success());
    assert_eq!(result.short_name(), "Sol Dex 5% 500mL Btl Viaflex");
    assert_eq!(result.character_count(), 28);
    assert_eq!(result.original(), REFERENCE);
    assert!(result.has_message(MessageKind::DroppedOptional));
}

#[test]
fn test_overflow_without_dictionary_drops_later_optionals_first() {
    let processor = ShortNameProcessor::with_defaults().unwrap();

    let result = processor.process_full_description(REFERENCE).unwrap();
    assert!(result.success());
    assert_eq!(result.short_name(), "Solution Dextrose 5% 500mL Bottle");
    assert_eq!(result.character_count(), 33);

    let dropped: Vec<&str> = result
        .messages()
        .iter()
        .filter(|m| m.kind == MessageKind::DroppedOptional)
        .map(|m| m.position_name.as_str())
        .collect();
    assert_eq!(dropped, vec!["special_attribute", "material"]);
}

#[test]
fn test_processing_is_idempotent() {
    let (processor, _dir) =
        processor_with_dictionary("term,abbreviation\nSolution,Sol\nDextrose,Dex\n");

    let first = processor.process_full_description(REFERENCE).unwrap();
    let second = processor.process_full_description(REFERENCE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_short_names_never_exceed_budget() {
    let processor = ShortNameProcessor::with_defaults().unwrap();
    let descriptions = [
        REFERENCE,
        "Injection Sodium Chloride 0.9% 1000 mL Infusion Bag Polyolefin Twist-Off Sterile",
        "Solution For Intravenous Infusion Undecylenic Polyethylene Glycol 3350 100 mg",
        "Tablet Acetaminophen 500 mg Bottle Plastic Child-Resistant Cap Pack of 100",
        "Suspension Amoxicillin 250 mg/5 mL 100 mL Dropper Bottle Glass Sugar-Free",
    ];

    for description in descriptions {
        let result = processor.process_full_description(description).unwrap();
        assert!(
            result.character_count() <= MAX_SHORT_NAME_LENGTH,
            "'{}' produced {} characters",
            result.short_name(),
            result.character_count()
        );
        assert_eq!(result.character_count(), result.short_name().chars().count());
    }
}

#[test]
fn test_missing_mandatory_is_reported() {
    let processor = ShortNameProcessor::with_defaults().unwrap();

    let result = processor
        .process_full_description("Dextrose 500 mL Bag")
        .unwrap();
    assert!(!result.success());
    assert!(result
        .message_texts()
        .contains(&"missing mandatory field: dosage_form".to_string()));
    assert!(result
        .message_texts()
        .contains(&"missing mandatory field: strength".to_string()));
}

#[test]
fn test_empty_input_is_a_validation_error() {
    let processor = ShortNameProcessor::with_defaults().unwrap();
    for input in ["", "   ", "\t\n"] {
        assert!(matches!(
            processor.process_full_description(input),
            Err(ShortNameError::ValidationError { .. })
        ));
    }
}

#[test]
fn test_no_dictionary_keeps_words_and_compacts_measures() {
    let processor = ShortNameProcessor::with_defaults().unwrap();

    let result = processor
        .process_full_description("Capsule Omeprazole 20 milligrams")
        .unwrap();
    assert!(result.success());
    assert_eq!(result.short_name(), "Capsule Omeprazole 20mg");
    assert_eq!(
        result
            .messages()
            .iter()
            .filter(|m| m.kind == MessageKind::NoAbbreviation)
            .count(),
        2
    );
}

#[test]
fn test_installed_entries_are_used_immediately() {
    let processor = ShortNameProcessor::with_defaults().unwrap();
    let dictionary = AbbreviationDictionary::from_entries(
        [("Capsule", "Cap"), ("Omeprazole", "Omep")],
        DuplicatePolicy::Overwrite,
    )
    .unwrap();
    processor.install_dictionary(dictionary).unwrap();

    let result = processor
        .process_full_description("Capsule Omeprazole 20 mg")
        .unwrap();
    assert_eq!(result.short_name(), "Cap Omep 20mg");
    assert!(!result.has_message(MessageKind::NoAbbreviation));
}

#[test]
fn test_long_ingredient_is_cut_before_strength_is_lost() {
    let processor = ShortNameProcessor::with_defaults().unwrap();

    let result = processor
        .process_full_description("Tablet Acetylsalicylic Acid Extended Release Buffered 325 mg")
        .unwrap();
    assert!(result.success());
    assert!(result.short_name().starts_with("Tablet Acetylsalicylic"));
    assert!(result.short_name().ends_with(" 325mg"));
    assert!(result.character_count() <= MAX_SHORT_NAME_LENGTH);
}

#[test]
fn test_measures_written_out_or_by_mass() {
    let processor = ShortNameProcessor::with_defaults().unwrap();

    let cases = [
        ("Solution Dextrose 5 percent 500 milliliters", "Solution Dextrose 5% 500mL"),
        ("Cream Hydrocortisone 1% 15 g", "Cream Hydrocortisone 1% 15g"),
        ("Solution Dextrose 5% 500 mL 250 mL Bag", "Solution Dextrose 5% 500mL Bag"),
    ];

    for (description, expected) in cases {
        let result = processor.process_full_description(description).unwrap();
        assert!(result.success(), "'{}' failed: {:?}", description, result.message_texts());
        assert_eq!(result.short_name(), expected);
    }
}
