use vellum_media::assist::{
    AssistRequest, ContextOption, build_prompt, copy_with_fallback, extract_content,
};

#[test]
fn prompt_always_ends_with_the_output_contract() {
    let request = AssistRequest::new("Write a short intro about otters");
    let prompt = build_prompt(&request);
    assert!(prompt.contains("Write a short intro about otters"));
    assert!(prompt.contains("HTML markup only"));
    assert!(prompt.ends_with("outside the HTML."));
}

#[test]
fn selection_context_is_included_only_when_requested() {
    let mut request = AssistRequest::new("Rewrite this");
    request.selected_text = Some("the selected sentence".to_string());

    let without = build_prompt(&request);
    assert!(!without.contains("the selected sentence"));

    request.context_option = ContextOption::Selection;
    let with = build_prompt(&request);
    assert!(with.contains("Selected text:"));
    assert!(with.contains("the selected sentence"));
}

#[test]
fn document_context_carries_the_full_markup() {
    let mut request = AssistRequest::new("Summarize");
    request.full_content = Some("<p>everything so far</p>".to_string());
    request.context_option = ContextOption::Document;

    let prompt = build_prompt(&request);
    assert!(prompt.contains("Current document:"));
    assert!(prompt.contains("<p>everything so far</p>"));
}

#[test]
fn preset_text_leads_the_prompt() {
    let mut request = AssistRequest::new("Continue the story");
    request.preset = Some("You are a concise technical writer.".to_string());
    let prompt = build_prompt(&request);
    assert!(prompt.starts_with("You are a concise technical writer."));
}

#[test]
fn generator_response_may_use_content_or_result() {
    assert_eq!(
        extract_content(&serde_json::json!({ "content": "<p>a</p>" })).as_deref(),
        Some("<p>a</p>")
    );
    assert_eq!(
        extract_content(&serde_json::json!({ "result": "<p>b</p>" })).as_deref(),
        Some("<p>b</p>")
    );
    // `content` wins when both are present.
    assert_eq!(
        extract_content(&serde_json::json!({ "content": "<p>a</p>", "result": "<p>b</p>" }))
            .as_deref(),
        Some("<p>a</p>")
    );
    assert_eq!(extract_content(&serde_json::json!({ "content": "" })), None);
    assert_eq!(extract_content(&serde_json::json!({ "other": 1 })), None);
}

#[test]
fn clipboard_copy_falls_back_to_the_legacy_path() {
    let mut fallback_calls = 0;
    let copied = copy_with_fallback(
        "text",
        |_| false,
        |_| {
            fallback_calls += 1;
            true
        },
    );
    assert!(copied);
    assert_eq!(fallback_calls, 1);

    // Primary success never reaches the fallback.
    let mut fallback_calls = 0;
    assert!(copy_with_fallback("text", |_| true, |_| {
        fallback_calls += 1;
        true
    }));
    assert_eq!(fallback_calls, 0);

    // Both failing gives up.
    assert!(!copy_with_fallback("text", |_| false, |_| false));
}
