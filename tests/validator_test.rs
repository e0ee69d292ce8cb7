use coursesmith::application::services::{validate_request, CourseRequest};
use coursesmith::domain::CourseKind;

fn valid_request() -> CourseRequest {
    CourseRequest {
        title: Some("Spanish for Travelers".to_string()),
        level: Some(3),
        kind: Some("lesson".to_string()),
        topics: Some(vec!["greetings".to_string(), "directions".to_string()]),
        total_chapters: Some(5),
        ..CourseRequest::default()
    }
}

#[test]
fn given_valid_request_when_validating_then_spec_is_normalized_with_defaults() {
    let spec = validate_request(valid_request()).expect("request should validate");

    assert_eq!(spec.title, "Spanish for Travelers");
    assert_eq!(spec.level, 3);
    assert_eq!(spec.kind, CourseKind::Lesson);
    assert_eq!(spec.total_chapters, 5);
    assert!(spec.include_exercises);
    assert!(spec.include_vocabulary);
    assert!(spec.references.is_empty());
}

#[test]
fn given_whitespace_title_when_validating_then_title_is_rejected() {
    let request = CourseRequest {
        title: Some("   ".to_string()),
        ..valid_request()
    };

    let error = validate_request(request).expect_err("should reject");
    assert_eq!(error.violations.len(), 1);
    assert_eq!(error.violations[0].field, "title");
}

#[test]
fn given_many_bad_fields_when_validating_then_every_violation_is_reported() {
    let request = CourseRequest {
        title: None,
        level: Some(9),
        kind: Some("podcast".to_string()),
        topics: Some(vec![]),
        total_chapters: Some(0),
        ..CourseRequest::default()
    };

    let error = validate_request(request).expect_err("should reject");
    let fields: Vec<&str> = error
        .violations
        .iter()
        .map(|v| v.field.as_str())
        .collect();

    assert_eq!(fields.len(), 5);
    for field in ["title", "level", "kind", "topics", "total_chapters"] {
        assert!(fields.contains(&field), "missing violation for {}", field);
    }
}

#[test]
fn given_blank_topic_entry_when_validating_then_topics_are_rejected() {
    let request = CourseRequest {
        topics: Some(vec!["greetings".to_string(), "  ".to_string()]),
        ..valid_request()
    };

    let error = validate_request(request).expect_err("should reject");
    assert_eq!(error.violations[0].field, "topics");
}

#[test]
fn given_boundary_values_when_validating_then_limits_are_inclusive() {
    let low = CourseRequest {
        level: Some(1),
        total_chapters: Some(1),
        ..valid_request()
    };
    assert!(validate_request(low).is_ok());

    let high = CourseRequest {
        level: Some(5),
        total_chapters: Some(50),
        ..valid_request()
    };
    assert!(validate_request(high).is_ok());

    let over = CourseRequest {
        total_chapters: Some(51),
        ..valid_request()
    };
    assert!(validate_request(over).is_err());
}

#[test]
fn given_option_flags_when_set_explicitly_then_they_are_preserved() {
    let request = CourseRequest {
        include_exercises: Some(false),
        include_vocabulary: Some(false),
        ..valid_request()
    };

    let spec = validate_request(request).expect("request should validate");
    assert!(!spec.include_exercises);
    assert!(!spec.include_vocabulary);
}
