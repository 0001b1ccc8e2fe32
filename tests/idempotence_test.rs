//! Round-trip/idempotence properties R1–R2 from `spec.md` §8.

use algolang::config::CompilerConfig;
use algolang::compile;

const PROGRAM: &str = concat!(
    "Algorithme A\n",
    "Variables:\n",
    "  x: entier\n",
    "  y: réel\n",
    "Instructions:\n",
    "  x <-- 1 + 2\n",
    "  y <-- x + 1.5\n",
    "  Pour i allant de 1 a 10 Faire\n",
    "    x <-- x + i\n",
    "  FinPour\n",
    "FinAlgo\n",
);

#[test]
fn r1_same_input_produces_byte_identical_output_and_diagnostics() {
    let cfg = CompilerConfig::default();
    let first = compile(PROGRAM, &cfg);
    let second = compile(PROGRAM, &cfg);

    assert_eq!(first.emitted, second.emitted);
    let first_msgs: Vec<_> = first.diagnostics.iter().map(|d| d.message.clone()).collect();
    let second_msgs: Vec<_> = second.diagnostics.iter().map(|d| d.message.clone()).collect();
    assert_eq!(first_msgs, second_msgs);
}

#[test]
fn r2_whitespace_only_edits_do_not_change_emitted_output() {
    let cfg = CompilerConfig::default();
    let base = compile(PROGRAM, &cfg);

    let with_blank_lines = concat!(
        "Algorithme A\n",
        "\n\n",
        "Variables:\n",
        "  x: entier\n",
        "  y: réel\n",
        "\n",
        "Instructions:\n",
        "  x <-- 1 + 2\n",
        "\n",
        "  y <-- x + 1.5\n",
        "  Pour i allant de 1 a 10 Faire\n",
        "    x <-- x + i\n",
        "  FinPour\n",
        "FinAlgo\n",
    );
    let reflowed = compile(with_blank_lines, &cfg);

    assert!(base.diagnostics.is_empty());
    assert!(reflowed.diagnostics.is_empty());
    assert_eq!(base.emitted, reflowed.emitted);
}
