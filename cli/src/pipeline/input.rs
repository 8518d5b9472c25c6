use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use shared::{AnswerVector, has_image_extension};

/// Why a line of operator input was rejected. The collector re-prompts on
/// every variant; none of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    MissingFile,
    BadExtension,
    NotYesNo,
}

impl InputRejection {
    pub fn message(&self) -> &'static str {
        match self {
            InputRejection::MissingFile | InputRejection::BadExtension => {
                "Invalid path or file format. Please try again."
            }
            InputRejection::NotYesNo => "Invalid input. Enter 'yes' or 'no'.",
        }
    }
}

/// Strips surrounding quote characters (drag-and-drop paste artifacts), then
/// validates extension and existence.
pub fn parse_image_path(raw: &str) -> Result<PathBuf, InputRejection> {
    let cleaned = raw.trim().trim_matches('"');
    let path = Path::new(cleaned);
    if !has_image_extension(path) {
        return Err(InputRejection::BadExtension);
    }
    if !path.exists() {
        return Err(InputRejection::MissingFile);
    }
    Ok(path.to_path_buf())
}

pub fn parse_yes_no(raw: &str) -> Result<u8, InputRejection> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" => Ok(1),
        "no" | "n" => Ok(0),
        _ => Err(InputRejection::NotYesNo),
    }
}

/// Blocking interactive collector over a line-based reader/writer pair.
/// Production runs wire it to stdio; tests inject buffers.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input stream closed while waiting for operator input",
            ));
        }
        Ok(line)
    }

    /// Re-prompts until the operator supplies an existing jpg/jpeg/png path.
    /// There is no retry bound; the pipeline waits as long as it takes.
    pub fn collect_image_path(&mut self, label: &str) -> io::Result<PathBuf> {
        loop {
            write!(self.output, "{label}: ")?;
            self.output.flush()?;
            let line = self.read_line()?;
            match parse_image_path(&line) {
                Ok(path) => return Ok(path),
                Err(rejection) => writeln!(self.output, "{}", rejection.message())?,
            }
        }
    }

    /// One answer per question, in question order, re-prompting per question
    /// until a yes/no token is supplied.
    pub fn collect_answers(&mut self, questions: &[&str]) -> io::Result<AnswerVector> {
        writeln!(self.output)?;
        writeln!(self.output, "Please answer the following questions (yes/no):")?;
        let mut values = Vec::with_capacity(questions.len());
        for question in questions {
            loop {
                write!(self.output, "{question}: ")?;
                self.output.flush()?;
                let line = self.read_line()?;
                match parse_yes_no(&line) {
                    Ok(value) => {
                        values.push(value);
                        break;
                    }
                    Err(rejection) => writeln!(self.output, "{}", rejection.message())?,
                }
            }
        }
        AnswerVector::new(values, questions.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn parse_yes_no_accepts_the_four_tokens() {
        assert_eq!(parse_yes_no("yes"), Ok(1));
        assert_eq!(parse_yes_no(" Y \n"), Ok(1));
        assert_eq!(parse_yes_no("No"), Ok(0));
        assert_eq!(parse_yes_no("n"), Ok(0));
        assert_eq!(parse_yes_no("maybe"), Err(InputRejection::NotYesNo));
        assert_eq!(parse_yes_no(""), Err(InputRejection::NotYesNo));
        assert_eq!(parse_yes_no("yess"), Err(InputRejection::NotYesNo));
    }

    #[test]
    fn parse_image_path_rejects_bad_extension_and_missing_file() {
        assert_eq!(
            parse_image_path("notes.txt"),
            Err(InputRejection::BadExtension)
        );
        assert_eq!(
            parse_image_path("definitely/not/here.jpg"),
            Err(InputRejection::MissingFile)
        );
    }

    #[test]
    fn quoted_path_accepted_identically_to_bare_path() {
        let path = std::env::temp_dir().join("fusion_input_quoted.jpg");
        fs::write(&path, b"stub").unwrap();

        let bare = parse_image_path(&path.display().to_string()).unwrap();
        let quoted = parse_image_path(&format!("\"{}\"", path.display())).unwrap();
        assert_eq!(bare, quoted);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn collect_answers_reprompts_until_valid() {
        let input = Cursor::new("maybe\nyes\nn\n");
        let mut console = Console::new(input, Vec::new());
        let answers = console.collect_answers(&["q1", "q2"]).unwrap();
        assert_eq!(answers.values(), &[1, 0]);

        let Console { output, .. } = console;
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Invalid input. Enter 'yes' or 'no'."));
    }

    #[test]
    fn collect_image_path_reprompts_then_accepts() {
        let path = std::env::temp_dir().join("fusion_input_loop.png");
        fs::write(&path, b"stub").unwrap();

        let input = Cursor::new(format!("nope.gif\n{}\n", path.display()));
        let mut console = Console::new(input, Vec::new());
        let accepted = console.collect_image_path("Path to image").unwrap();
        assert_eq!(accepted, path);

        let Console { output, .. } = console;
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Invalid path or file format."));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn closed_input_is_fatal_not_a_retry() {
        let input = Cursor::new("");
        let mut console = Console::new(input, Vec::new());
        let err = console.collect_image_path("Path to image").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
