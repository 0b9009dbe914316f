//! End-to-end tests for the blame pipeline: stream in, annotated and
//! age-scored model out.

use gitage::blame::{normalize_ages, parse_stream, BlameError, BlameModel};

const ALICE: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn annotate(file_text: &str, records: &[String]) -> BlameModel {
    let mut model = parse_stream(file_text, records).expect("parse");
    normalize_ages(&mut model.commits);
    model
}

#[test]
fn worked_example_two_authors() {
    let model = annotate(
        "alpha\nbeta\ngamma\n",
        &[
            format!("{ALICE} 1 1 2"),
            "author Alice".to_string(),
            "author-mail <alice@example.com>".to_string(),
            "author-time 1000".to_string(),
            format!("{BOB} 1 3 1"),
            "author Bob".to_string(),
            "author-mail <bob@example.com>".to_string(),
            "author-time 2000".to_string(),
        ],
    );

    // Coverage: sum of num_lines == line count == file lines
    assert_eq!(model.lines.len(), 3);

    // Lines 1-2 belong to Alice's commit, line 3 to Bob's
    assert_eq!(model.commit_of(&model.lines[0]).id, ALICE);
    assert_eq!(model.commit_of(&model.lines[1]).id, ALICE);
    assert_eq!(model.commit_of(&model.lines[2]).id, BOB);

    // Alice is oldest (age 100), Bob newest (age 0)
    assert_eq!(model.commit_of(&model.lines[0]).age, Some(100));
    assert_eq!(model.commit_of(&model.lines[2]).age, Some(0));

    // Ordering: strictly increasing resultline
    let resultlines: Vec<u32> = model.lines.iter().map(|l| l.resultline).collect();
    assert_eq!(resultlines, vec![1, 2, 3]);
}

#[test]
fn repeated_commit_id_yields_one_commit_with_unioned_metadata() {
    let model = annotate(
        "a\nb\nc\nd\n",
        &[
            format!("{ALICE} 1 1 1"),
            "author Alice".to_string(),
            format!("{BOB} 1 2 2"),
            "author Bob".to_string(),
            format!("{ALICE} 4 4 1"),
            "summary touch up".to_string(),
        ],
    );

    assert_eq!(model.commits.len(), 2);
    let alice = model.commits.get(model.commits.lookup(ALICE).unwrap());
    assert_eq!(alice.author.as_deref(), Some("Alice"));
    assert_eq!(alice.summary.as_deref(), Some("touch up"));
}

#[test]
fn conflicting_author_time_is_a_parse_error() {
    let err = parse_stream(
        "a\n",
        &[
            format!("{ALICE} 1 1 1"),
            "author-time 100".to_string(),
            format!("{ALICE} 1 1 1"),
            "author-time 200".to_string(),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, BlameError::AttributeMismatch { .. }));
}

#[test]
fn empty_stream_is_distinguished_from_malformed() {
    let err = parse_stream("a\n", Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, BlameError::NothingToAnnotate));

    let err = parse_stream("a\n", [format!("{ALICE} one 1 1")]).unwrap_err();
    assert!(matches!(err, BlameError::MalformedHeader { .. }));
}

#[test]
fn ages_are_bounded_and_monotonic_across_many_commits() {
    let times = [500i64, 100, 900, 700, 300];
    let file_text = "l\n".repeat(times.len());
    let mut records = Vec::new();
    for (i, t) in times.iter().enumerate() {
        records.push(format!("{i:040x} 1 {} 1", i + 1));
        records.push(format!("author-time {t}"));
    }
    let model = annotate(&file_text, &records);

    let scored: Vec<(i64, u8)> = model
        .commits
        .iter()
        .map(|c| (c.author_time.unwrap(), c.age.unwrap()))
        .collect();
    for &(_, age) in &scored {
        assert!(age <= 100);
    }
    for &(ta, aa) in &scored {
        for &(tb, ab) in &scored {
            if ta > tb {
                assert!(aa <= ab);
            }
        }
    }
    // Extremes pin the scale
    assert!(scored.iter().any(|&(t, a)| t == 100 && a == 100));
    assert!(scored.iter().any(|&(t, a)| t == 900 && a == 0));
}

#[test]
fn uncommitted_lines_get_the_zero_id_pseudo_commit() {
    let zero = "0".repeat(40);
    let model = annotate(
        "draft\n",
        &[
            format!("{zero} 1 1 1"),
            "author Not Committed Yet".to_string(),
            "author-mail <not.committed.yet>".to_string(),
        ],
    );
    let commit = model.commit_of(&model.lines[0]);
    assert!(commit.is_uncommitted());
    // No author_time: maximally aged
    assert_eq!(commit.age, Some(100));
}
