use super::*;

const COMPLETE_STATE: &str = r#"<html><head>
<meta property="og:description" content="og text #ignored">
<meta property="og:image" content="https://cdn.example/og.jpg">
<script id="SIGI_STATE" type="application/json">{"ItemModule":{"7301":{
  "desc":"Leg day #Fitness #gym",
  "video":{"duration":31,"cover":"https://cdn.example/cover.jpg"},
  "stats":{"playCount":1000,"diggCount":50,"commentCount":20,"shareCount":10,"collectCount":20},
  "textExtra":[{"hashtagName":"fitness"},{"hashtagName":"gym"}]
}}}</script>
<script type="application/ld+json">{"@type":"VideoObject","description":"ld text","interactionStatistic":{"interactionType":"WatchAction","userInteractionCount":999999}}</script>
</head><body><strong data-e2e="like-count">77K</strong></body></html>"#;

/// State with views but no description or thumbnail; JSON-LD supplies both.
const PARTIAL_STATE: &str = r#"<html><head>
<script id="SIGI_STATE">{"ItemModule":{"1":{"stats":{"playCount":100}}}}</script>
<script type="application/ld+json">{"@type":"VideoObject","description":"x","thumbnailUrl":"https://cdn.example/ld.jpg","duration":"PT15S",
  "interactionStatistic":[{"interactionType":"WatchAction","userInteractionCount":5000},{"interactionType":"LikeAction","userInteractionCount":40}]}</script>
</head></html>"#;

#[test]
fn complete_state_short_circuits_numeric_strategies() {
    let (result, trace) = extract_with_trace(COMPLETE_STATE);

    assert_eq!(result.counts.views, 1000);
    assert_eq!(result.counts.likes, 50);
    assert_eq!(result.description, "Leg day #Fitness #gym");
    assert_eq!(result.thumbnail, "https://cdn.example/cover.jpg");
    assert_eq!(result.duration_seconds, 31);
    assert_eq!(result.hashtags.as_slice(), ["#fitness", "#gym"]);
    assert_eq!(trace.short_circuited_after, Some(Strategy::StructuredState));
    assert_eq!(
        trace.steps.iter().map(|s| s.strategy).collect::<Vec<_>>(),
        vec![Strategy::StructuredState, Strategy::Metadata]
    );
}

#[test]
fn later_strategy_fills_only_empty_fields() {
    let result = extract(PARTIAL_STATE);

    assert_eq!(result.counts.views, 100, "earlier view count must survive");
    assert_eq!(result.counts.likes, 40);
    assert_eq!(result.description, "x");
    assert_eq!(result.thumbnail, "https://cdn.example/ld.jpg");
    assert_eq!(result.duration_seconds, 15);
}

#[test]
fn views_only_policy_stops_after_first_view_count() {
    let cascade = Cascade::new(CascadePolicy::ViewsOnly);
    let (result, trace) = cascade.extract_with_trace(PARTIAL_STATE);

    assert_eq!(trace.short_circuited_after, Some(Strategy::StructuredState));
    assert_eq!(result.counts.likes, 0);
    assert!(result.description.is_empty());
    assert!(result.thumbnail.is_empty());
}

#[test]
fn metadata_backfill_runs_after_short_circuit() {
    let html = r#"<html><head>
        <meta property="og:description" content="from og #Tag">
        <meta property="og:image" content="https://cdn.example/og.jpg">
        <script id="SIGI_STATE">{"ItemModule":{"1":{"stats":{"playCount":5}}}}</script>
    </head></html>"#;
    let (result, trace) = Cascade::new(CascadePolicy::ViewsOnly).extract_with_trace(html);

    assert_eq!(result.description, "from og #Tag");
    assert_eq!(result.thumbnail, "https://cdn.example/og.jpg");
    assert_eq!(result.hashtags.as_slice(), ["#tag"]);
    assert_eq!(trace.contributors(), vec![Strategy::StructuredState, Strategy::Metadata]);
}

#[test]
fn regex_and_dom_fill_independent_counters() {
    let html = r#"<html><body>
        <script>var a = {"playCount":"321"};</script>
        <strong data-e2e="share-count">1.2K</strong>
    </body></html>"#;
    let (result, trace) = extract_with_trace(html);

    assert_eq!(result.counts.views, 321);
    assert_eq!(result.counts.shares, 1_200);
    assert_eq!(trace.short_circuited_after, None);
    assert_eq!(
        trace.contributors(),
        vec![Strategy::RegexScan, Strategy::DomSelectors]
    );
}

#[test]
fn nothing_found_yields_fully_shaped_zero_result() {
    let (result, trace) = extract_with_trace("<html><body><p>private video</p></body></html>");
    assert_eq!(result, ExtractionResult::default());
    assert!(trace.contributors().is_empty());
    assert_eq!(trace.steps.len(), 5);
}

#[test]
fn hostile_inputs_never_panic() {
    let inputs = [
        "",
        "\0\u{feff}garbage",
        "<script id=\"SIGI_STATE\">{\"ItemModule\":{\"1\":{\"stats\":",
        "<script type=\"application/ld+json\">[[[[</script>",
        "<meta property=\"og:description\">",
        "playCount: 99999999999999999999999999",
        "<<<<>>>>{{{{}}}}",
    ];
    for input in inputs {
        let result = extract(input);
        assert!(result.hashtags.iter().all(|t| t.starts_with('#')));
    }
}

#[test]
fn extraction_is_deterministic() {
    let first = serde_json::to_string(&extract(COMPLETE_STATE)).unwrap();
    let second = serde_json::to_string(&extract(COMPLETE_STATE)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn policy_satisfaction_rules() {
    let mut result = ExtractionResult::default();
    result.counts.views = 1;
    assert!(CascadePolicy::ViewsOnly.is_satisfied(&result));
    assert!(!CascadePolicy::RequireComplete.is_satisfied(&result));

    result.description = "d".into();
    result.thumbnail = "t".into();
    assert!(CascadePolicy::RequireComplete.is_satisfied(&result));
}

#[test]
fn strategy_names_are_snake_case() {
    assert_eq!(Strategy::LinkedData.to_string(), "linked_data");
    assert_eq!(
        serde_json::to_value(Strategy::DomSelectors).unwrap(),
        serde_json::json!("dom_selectors")
    );
}
