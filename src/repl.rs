use once_cell::sync::Lazy;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{CompletionType, Config as RustylineConfig, Context, EditMode, Editor, Helper, Result};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;

static HISTORY_PATH: Lazy<PathBuf> = Lazy::new(|| {
    let home_dir = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home_dir).join(".yiqi.history")
});

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    History,
    Tickers,
    Select(Vec<String>),
    Query(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return Command::Empty;
        }
        if input.eq_ignore_ascii_case("quit") || input == "/quit" {
            return Command::Quit;
        }

        let mut words = input.split_whitespace();
        match words.next() {
            Some("/history") => Command::History,
            Some("/tickers") => Command::Tickers,
            Some("/select") => Command::Select(
                words
                    .map(|w| w.trim_start_matches('@').to_uppercase())
                    .filter(|w| !w.is_empty())
                    .collect(),
            ),
            _ => Command::Query(input.to_string()),
        }
    }
}

/// Symbols written as `@TICKER` in a line, uppercased, trailing punctuation
/// removed.
pub fn mentioned_tickers(line: &str) -> Vec<String> {
    line.split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .map(|t| {
            t.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '.')
                .trim_end_matches('.')
                .to_uppercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

pub struct ReplHelper {
    tickers: Vec<String>,
}

impl ReplHelper {
    pub fn new(tickers: Vec<String>) -> Self {
        ReplHelper { tickers }
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        if let Some(at_pos) = line[..pos].rfind('@') {
            let prefix = &line[at_pos + 1..pos].to_uppercase();

            let candidates: Vec<Pair> = self
                .tickers
                .iter()
                .filter(|ticker| ticker.to_uppercase().starts_with(prefix.as_str()))
                .map(|ticker| Pair {
                    display: ticker.clone(),
                    replacement: ticker.clone(),
                })
                .collect();

            Ok((at_pos + 1, candidates))
        } else {
            Ok((pos, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.contains('@') {
            return Cow::Borrowed(line);
        }

        let mut highlighted = String::new();
        let mut in_ticker = false;
        for c in line.chars() {
            if c == '@' {
                in_ticker = true;
                highlighted.push_str("\x1b[32m"); // Green for tickers
                highlighted.push(c);
            } else if in_ticker && !(c.is_alphanumeric() || c == '.' || c == '-') {
                in_ticker = false;
                highlighted.push_str("\x1b[0m");
                highlighted.push(c);
            } else {
                highlighted.push(c);
            }
        }
        if in_ticker {
            highlighted.push_str("\x1b[0m");
        }
        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, line: &str, _pos: usize, _kind: CmdKind) -> bool {
        line.contains('@')
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> Result<ValidationResult> {
        for ticker in mentioned_tickers(ctx.input()) {
            if !self.tickers.iter().any(|t| t.eq_ignore_ascii_case(&ticker)) {
                return Ok(ValidationResult::Invalid(Some(format!(
                    " (ticker {} is not part of this space)",
                    ticker
                ))));
            }
        }

        Ok(ValidationResult::Valid(None))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Helper for ReplHelper {}

pub fn create_editor(tickers: Vec<String>) -> Result<EditorWithHistory> {
    log::debug!("Creating rustyline editor configuration");
    let rustyline_config = RustylineConfig::builder()
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut rl = Editor::<ReplHelper, FileHistory>::with_config(rustyline_config)?;

    if rl.load_history(HISTORY_PATH.as_path()).is_err() {
        log::debug!("No previous history file found");
    }

    rl.set_helper(Some(ReplHelper::new(tickers)));
    Ok(EditorWithHistory::new(rl))
}

pub struct EditorWithHistory {
    inner: Editor<ReplHelper, FileHistory>,
}

impl EditorWithHistory {
    fn new(editor: Editor<ReplHelper, FileHistory>) -> Self {
        EditorWithHistory { inner: editor }
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String> {
        let line = self.inner.readline(prompt)?;
        let _ = self.inner.add_history_entry(line.as_str());
        Ok(line)
    }

    pub fn save_history(&mut self) -> Result<()> {
        self.inner.save_history(HISTORY_PATH.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::DefaultHistory;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("/history"), Command::History);
        assert_eq!(Command::parse("/tickers"), Command::Tickers);
        assert_eq!(
            Command::parse("/select @aapl msft"),
            Command::Select(vec!["AAPL".to_string(), "MSFT".to_string()])
        );
        assert_eq!(
            Command::parse(" How is @AAPL doing? "),
            Command::Query("How is @AAPL doing?".to_string())
        );
    }

    #[test]
    fn test_mentioned_tickers() {
        assert_eq!(
            mentioned_tickers("Compare @aapl, @MSFT and @brk.b."),
            vec!["AAPL", "MSFT", "BRK.B"]
        );
        assert!(mentioned_tickers("no mentions @ here").is_empty());
    }

    #[test]
    fn test_complete_session_tickers() {
        let helper = ReplHelper::new(vec!["AAPL".to_string(), "AMZN".to_string(), "MSFT".to_string()]);
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, candidates) = helper.complete("about @a", 8, &ctx).unwrap();
        assert_eq!(start, 7);
        let names: Vec<&str> = candidates.iter().map(|c| c.replacement.as_str()).collect();
        assert_eq!(names, vec!["AAPL", "AMZN"]);

        let (_, none) = helper.complete("no at sign", 10, &ctx).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_highlight_marks_mentions() {
        let helper = ReplHelper::new(vec![]);
        assert_eq!(helper.highlight("plain", 0), "plain");
        assert_eq!(helper.highlight("@AAPL now", 0), "\x1b[32m@AAPL\x1b[0m now");
    }

    #[test]
    fn test_typing_refreshes_mentions() {
        let helper = ReplHelper::new(vec![]);
        assert!(helper.highlight_char("about @AA", 9, CmdKind::Other));
        assert!(helper.highlight_char("@", 1, CmdKind::ForcedRefresh));
        assert!(!helper.highlight_char("plain text", 10, CmdKind::Other));
    }
}
