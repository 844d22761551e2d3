use super::*;

#[test]
fn test_generate_title() {
    assert_eq!(generate_title("  hello   world  "), "hello world");
    assert_eq!(generate_title("Hi"), "Hi");
    assert_eq!(generate_title("line one\n\tline two"), "line one line two");

    assert_eq!(generate_title(""), "New Chat");
    assert_eq!(generate_title(" \n\t "), "New Chat");
}

#[test]
fn test_generate_title_truncates() {
    let prompt = "a".repeat(60);
    let title = generate_title(&prompt);
    assert_eq!(title, format!("{}...", "a".repeat(50)));

    let exact = "b".repeat(50);
    assert_eq!(generate_title(&exact), exact);

    // The cut never leaves a dangling space before the ellipsis.
    let prompt = format!("{} {}", "c".repeat(49), "d".repeat(20));
    assert_eq!(generate_title(&prompt), format!("{}...", "c".repeat(49)));
}

#[test]
fn test_generate_title_counts_chars() {
    let prompt = "é".repeat(55);
    assert_eq!(generate_title(&prompt), format!("{}...", "é".repeat(50)));
}
