use chrono::DateTime;
use memo_core::{
    collect_tags, filter_by_priority, filter_by_search, filter_by_tag, sort_by_recent, Memo,
    MemoFilter, Priority, PriorityFilter,
};

fn memo(id: i64, title: &str, content: &str, priority: Priority, tags: &[&str], updated_ms: i64) -> Memo {
    Memo {
        id,
        title: title.to_string(),
        content: content.to_string(),
        priority,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        created_at: DateTime::from_timestamp_millis(0).unwrap(),
        updated_at: DateTime::from_timestamp_millis(updated_ms).unwrap(),
    }
}

fn sample() -> Vec<Memo> {
    vec![
        memo(1, "Groceries", "milk and eggs", Priority::Low, &["home"], 1_000),
        memo(2, "Sprint review", "demo the Memo API", Priority::High, &["work", "Demo"], 3_000),
        memo(3, "Dentist", "call back on monday", Priority::Medium, &[], 2_000),
        memo(4, "Reading list", "rust book", Priority::High, &["Work"], 2_000),
    ]
}

fn ids(memos: &[Memo]) -> Vec<i64> {
    memos.iter().map(|memo| memo.id).collect()
}

#[test]
fn blank_search_term_returns_input_unchanged() {
    let input = sample();
    assert_eq!(filter_by_search(input.clone(), ""), input);
    assert_eq!(filter_by_search(input.clone(), "   \t"), input);
}

#[test]
fn search_is_case_insensitive_substring_over_title_content_and_tags() {
    assert_eq!(ids(&filter_by_search(sample(), "GROC")), vec![1]);
    assert_eq!(ids(&filter_by_search(sample(), "memo api")), vec![2]);
    // "demo" hits memo 2 through both content and the `Demo` tag.
    assert_eq!(ids(&filter_by_search(sample(), "demo")), vec![2]);
    assert_eq!(ids(&filter_by_search(sample(), "ork")), vec![2, 4]);
    assert!(filter_by_search(sample(), "absent").is_empty());
}

#[test]
fn priority_all_is_identity_and_concrete_priority_is_exact_subset() {
    let input = sample();
    assert_eq!(filter_by_priority(input.clone(), PriorityFilter::All), input);

    let high = filter_by_priority(input, PriorityFilter::Only(Priority::High));
    assert_eq!(ids(&high), vec![2, 4]);
    assert!(high.iter().all(|memo| memo.priority == Priority::High));
}

#[test]
fn tag_filter_is_exact_and_case_sensitive() {
    assert_eq!(ids(&filter_by_tag(sample(), "work")), vec![2]);
    assert_eq!(ids(&filter_by_tag(sample(), "Work")), vec![4]);
    assert!(filter_by_tag(sample(), "wor").is_empty());
    assert_eq!(filter_by_tag(sample(), ""), sample());
}

#[test]
fn sort_by_recent_is_stable_and_idempotent() {
    let mut memos = sample();
    sort_by_recent(&mut memos);
    // Memos 3 and 4 tie on updated_at and keep their input order.
    assert_eq!(ids(&memos), vec![2, 3, 4, 1]);

    let once = memos.clone();
    sort_by_recent(&mut memos);
    assert_eq!(memos, once);
}

#[test]
fn memo_filter_composes_criteria_and_sorts() {
    let filter = MemoFilter {
        search: "r".to_string(),
        priority: PriorityFilter::Only(Priority::High),
        tag: String::new(),
    };
    assert_eq!(ids(&filter.apply(sample())), vec![2, 4]);

    let filter = MemoFilter {
        tag: "Work".to_string(),
        ..filter
    };
    assert_eq!(ids(&filter.apply(sample())), vec![4]);

    assert_eq!(ids(&MemoFilter::default().apply(sample())), vec![2, 3, 4, 1]);
}

#[test]
fn collect_tags_is_sorted_and_deduplicated() {
    let mut memos = sample();
    memos.push(memo(5, "dup", "dup", Priority::Low, &["home", "work"], 10));
    assert_eq!(collect_tags(&memos), vec!["Demo", "Work", "home", "work"]);
    assert!(collect_tags(&[]).is_empty());
}
