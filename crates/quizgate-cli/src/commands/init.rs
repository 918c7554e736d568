//! The `quizgate init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizgate.toml").exists() {
        println!("quizgate.toml already exists, skipping.");
    } else {
        std::fs::write("quizgate.toml", SAMPLE_CONFIG)?;
        println!("Created quizgate.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizgate validate --bank banks/example.toml");
    println!("  2. Run: quizgate play --bank banks/example.toml --answers b,a,x");
    println!("  3. Run: quizgate record");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizgate configuration

default_passing_score = 80
commit_timeout_ms = 5000
record_path = "./quizgate-record.json"
enable_skip = false

# Allow a new attempt to overwrite better values already on the record.
[overwrite]
completion_status = false
success_status = false
higher_score = false
"#;

const EXAMPLE_BANK: &str = r#"[assessment]
id = "example"
name = "Example Post-Test"
is_post_assessment = true
only_retake_incorrect = true
passing_score = 70

[[questions]]
id = "capital"
name = "Capital city"
stem = "What is the capital of France? (a) Lyon (b) Paris (c) Nice"
correct_response = "b"
correct_feedback = "Correct."
incorrect_feedback = "It is Paris."

[[questions]]
id = "boiling"
name = "Boiling point"
stem = "At sea level, water boils at: (a) 100 C (b) 90 C (c) 110 C"
correct_response = "a"
correct_feedback = "Correct."
incorrect_feedback = "It is 100 degrees Celsius."

[[questions]]
id = "planets"
name = "Planets"
stem = "How many planets orbit the Sun? (a) seven (b) nine (c) eight"
correct_response = "c"
correct_feedback = "Correct."
incorrect_feedback = "There are eight."
"#;
