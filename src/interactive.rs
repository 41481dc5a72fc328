//! # Interactive Mode
//!
//! Modalità interattiva usata quando la CLI viene avviata senza path.
//!
//! ## Responsabilità:
//! - Chiedere il formato di destinazione finché non è valido
//! - Chiedere il path finché non esiste (le virgolette attorno vengono rimosse)
//! - Chiedere se usare l'elaborazione parallela quando il path è una directory
//!
//! Le funzioni sono generiche su `BufRead`/`Write` così da poter essere
//! testate senza terminale.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::formats;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Answers collected from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveChoice {
    pub target_format: String,
    pub path: PathBuf,
    pub parallel: bool,
}

/// Ask for format, path and (for directories) parallel mode
pub fn prompt<R: BufRead, W: Write>(
    config: &ConversionConfig,
    input: &mut R,
    output: &mut W,
) -> Result<InteractiveChoice, ConvertError> {
    writeln!(output, "=== Video Format Converter ===")?;
    writeln!(output, "Supported formats: {}", config.supported_formats.join(", "))?;

    let target_format = loop {
        let answer = formats::normalize(&ask(input, output, "Target format: ")?);
        if config.supports(&answer) {
            break answer;
        }
        writeln!(
            output,
            "Unsupported format, choose one of: {}",
            config.supported_formats.join(", ")
        )?;
    };

    let path = loop {
        let answer = ask(input, output, "Video file or folder path: ")?;
        let path = PathBuf::from(strip_quotes(&answer));
        if path.exists() {
            break path;
        }
        writeln!(output, "Path does not exist, try again")?;
    };

    let parallel = if path.is_dir() {
        let answer = ask(input, output, "Use parallel processing? (y/n, default y): ")?;
        !answer.eq_ignore_ascii_case("n")
    } else {
        false
    };

    Ok(InteractiveChoice {
        target_format,
        path,
        parallel,
    })
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String, ConvertError> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(ConvertError::InvalidInput("Input closed before an answer was given".into()));
    }
    Ok(line.trim().to_string())
}

fn strip_quotes(answer: &str) -> &str {
    answer.trim().trim_matches(|c| c == '\'' || c == '"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::touch;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run(script: &str) -> (Result<InteractiveChoice, ConvertError>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let choice = prompt(&ConversionConfig::default(), &mut input, &mut output);
        (choice, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_reprompts_until_valid() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let script = format!("gif\n.MKV\n{}\n\"{}\"\nn\n", missing.display(), dir.path().display());

        let (choice, transcript) = run(&script);
        let choice = choice.unwrap();

        assert_eq!(choice.target_format, "mkv");
        assert_eq!(choice.path, dir.path());
        assert!(!choice.parallel);
        assert!(transcript.contains("Unsupported format"));
        assert!(transcript.contains("Path does not exist"));
    }

    #[test]
    fn test_parallel_defaults_to_yes() {
        let dir = TempDir::new().unwrap();
        let script = format!("mp4\n'{}'\n\n", dir.path().display());

        let choice = run(&script).0.unwrap();
        assert!(choice.parallel);
    }

    #[test]
    fn test_single_file_skips_parallel_question() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "clip.avi");
        let script = format!("webm\n{}\n", file.display());

        let (choice, transcript) = run(&script);
        assert_eq!(choice.unwrap().path, file);
        assert!(!transcript.contains("parallel"));
    }

    #[test]
    fn test_closed_input() {
        let (choice, _) = run("flac\n");
        assert!(matches!(choice, Err(ConvertError::InvalidInput(_))));
    }
}
