//! Interactive text menu
//!
//! A numbered menu read line by line from any `BufRead` and written to any
//! `Write`, so it can be driven by a terminal or by a test script. Choices
//! are parsed into [`MainChoice`]/[`KeyChoice`] with a [`ChoiceError`] for
//! malformed input, kept apart from the storage errors.

use crossterm::style::{StyledContent, Stylize};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::provider::{ProviderError, WordnikClient};
use crate::store::{
    CacheEntry, CredentialStore, IdGenerator, Index, Lookup, ProviderLabel, SearchError,
    SearchOutcome, StoreError, Stored,
};

/// Errors that end the menu loop
#[derive(Debug, Error)]
pub enum MenuError {
    /// Standard input reached end of file
    #[error("Input stream has been closed")]
    InputClosed,

    /// Reading input or writing output failed
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The search history could not be opened
    #[error("Search history unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Why a line of input is not a valid menu choice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("no choice entered")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{0} is not on the menu")]
    OutOfRange(u32),
}

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    Search,
    History,
    RemoveWord,
    ClearHistory,
    ConfigureKey,
    Exit,
}

/// Entries of the API key menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChoice {
    AddOrOverwrite,
    Remove,
    Reveal,
    Back,
}

/// Parses a line into a menu number
fn parse_number(input: &str) -> Result<u32, ChoiceError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChoiceError::Empty);
    }
    input
        .parse()
        .map_err(|_| ChoiceError::NotANumber(input.to_string()))
}

/// Parses a main menu choice
pub fn parse_main_choice(input: &str) -> Result<MainChoice, ChoiceError> {
    match parse_number(input)? {
        1 => Ok(MainChoice::Search),
        2 => Ok(MainChoice::History),
        3 => Ok(MainChoice::RemoveWord),
        4 => Ok(MainChoice::ClearHistory),
        5 => Ok(MainChoice::ConfigureKey),
        0 => Ok(MainChoice::Exit),
        n => Err(ChoiceError::OutOfRange(n)),
    }
}

/// Parses an API key menu choice
pub fn parse_key_choice(input: &str) -> Result<KeyChoice, ChoiceError> {
    match parse_number(input)? {
        1 => Ok(KeyChoice::AddOrOverwrite),
        2 => Ok(KeyChoice::Remove),
        3 => Ok(KeyChoice::Reveal),
        0 => Ok(KeyChoice::Back),
        n => Err(ChoiceError::OutOfRange(n)),
    }
}

/// Whether a confirmation answer means yes
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().chars().next(), Some('y' | 'Y'))
}

/// Colored status tags printed before messages
#[derive(Debug, Clone, Copy)]
enum Tag {
    Fail,
    Info,
    Done,
    Ques,
}

impl Tag {
    fn styled(self) -> StyledContent<&'static str> {
        match self {
            Tag::Fail => "FAIL".red(),
            Tag::Info => "INFO".blue(),
            Tag::Done => "DONE".green(),
            Tag::Ques => "QUES".yellow(),
        }
    }
}

/// Reads one line, mapping end of input to `MenuError::InputClosed`
fn read_line<R: BufRead>(input: &mut R) -> Result<String, MenuError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(MenuError::InputClosed);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<String, MenuError> {
    write!(output, "\n[{}] {} ", Tag::Ques.styled(), question)?;
    output.flush()?;
    read_line(input)
}

fn say<W: Write>(output: &mut W, tag: Tag, message: impl Display) -> io::Result<()> {
    writeln!(output, "\n[{}] {}", tag.styled(), message)
}

/// Opens the index, offering to reset it if the file is corrupted
///
/// A permission failure is returned as an error rather than replaced with
/// an empty history.
fn open_index_with_repair<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    data_dir: &Path,
    ids: IdGenerator,
) -> Result<Index, MenuError> {
    match Index::open(data_dir, ids.clone()) {
        Ok(index) => Ok(index),
        Err(err) if err.is_corrupted() => {
            say(output, Tag::Fail, format!("Unable to read history: {}", err))?;
            let answer = ask(input, output, "Would you like to reset the history (N/y)?")?;
            if !is_yes(&answer) {
                return Err(err.into());
            }
            let index = Index::reset(data_dir, ids)?;
            say(output, Tag::Done, "Repair successful")?;
            Ok(index)
        }
        Err(err) => Err(err.into()),
    }
}

/// The Power-Dict menu
pub struct Menu<R, W> {
    input: R,
    output: W,
    data_dir: PathBuf,
    index: Index,
    credentials: Option<CredentialStore>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// Opens the stores in `data_dir` and prepares the menu
    ///
    /// The credential store is opened lazily, the first time a key is
    /// needed.
    pub fn open(
        mut input: R,
        mut output: W,
        data_dir: &Path,
        ids: IdGenerator,
    ) -> Result<Self, MenuError> {
        let index = open_index_with_repair(&mut input, &mut output, data_dir, ids)?;
        Ok(Self::with_index(input, output, data_dir, index))
    }

    /// Builds a menu around an already opened index
    pub fn with_index(input: R, output: W, data_dir: &Path, index: Index) -> Self {
        Self {
            input,
            output,
            data_dir: data_dir.to_path_buf(),
            index,
            credentials: None,
        }
    }

    /// Consumes the menu and flushes the index
    pub fn close(self) -> Result<(), StoreError> {
        self.index.close()
    }

    /// Runs the main menu until the user exits or input closes
    pub async fn run(&mut self) -> Result<(), MenuError> {
        match self.main_loop().await {
            Err(MenuError::InputClosed) => {
                say(&mut self.output, Tag::Fail, "Input stream has been closed. Bye.")?;
                Ok(())
            }
            other => other,
        }
    }

    async fn main_loop(&mut self) -> Result<(), MenuError> {
        loop {
            self.print_main_menu()?;
            let line = self.ask("Please enter your choice:")?;

            match parse_main_choice(&line) {
                Ok(MainChoice::Search) => self.search().await?,
                Ok(MainChoice::History) => self.history()?,
                Ok(MainChoice::RemoveWord) => self.remove_word()?,
                Ok(MainChoice::ClearHistory) => self.clear_history()?,
                Ok(MainChoice::ConfigureKey) => {
                    self.configure_key()?;
                    continue;
                }
                Ok(MainChoice::Exit) => return Ok(()),
                Err(err) => self.say(Tag::Fail, format!("Please enter a valid choice ({})", err))?,
            }

            self.pause()?;
        }
    }

    fn print_main_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n\nWelcome to Power Dict")?;
        writeln!(self.output, "---------------------")?;
        writeln!(self.output, "\n[1] Search a word")?;
        writeln!(self.output, "\n[2] Print history")?;
        writeln!(self.output, "\n[3] Remove a word from history")?;
        writeln!(self.output, "\n[4] Clear all history")?;
        writeln!(self.output, "\n[5] Configure API key")?;
        writeln!(self.output, "\n[0] Exit")
    }

    fn ask(&mut self, question: &str) -> Result<String, MenuError> {
        ask(&mut self.input, &mut self.output, question)
    }

    fn say(&mut self, tag: Tag, message: impl Display) -> io::Result<()> {
        say(&mut self.output, tag, message)
    }

    fn confirm(&mut self, question: &str) -> Result<bool, MenuError> {
        let answer = self.ask(&format!("{} (y/N)?", question))?;
        Ok(is_yes(&answer))
    }

    fn pause(&mut self) -> Result<(), MenuError> {
        write!(self.output, "\n\nPress enter to return to the menu ")?;
        self.output.flush()?;
        read_line(&mut self.input).map(|_| ())
    }

    fn print_entry(&mut self, entry: &CacheEntry) -> io::Result<()> {
        writeln!(self.output, "\n\n{}\n\n{}", "Word -".magenta(), entry.word)?;

        if !entry.definitions.is_empty() {
            writeln!(self.output, "\n{}\n", "Definitions -".magenta())?;
            for (i, definition) in entry.definitions.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, definition)?;
            }
        }

        if !entry.synonyms.is_empty() {
            writeln!(self.output, "\n{}\n\n{}", "Synonyms -".magenta(), entry.synonyms)?;
        }
        Ok(())
    }

    fn print_cached(&mut self, stored: &Stored<CacheEntry>) -> io::Result<()> {
        let cached_on = stored.saved_at.format("%Y-%m-%d");
        self.say(Tag::Info, format!("showing cached results from {}", cached_on))?;
        self.print_entry(&stored.record)
    }

    async fn search(&mut self) -> Result<(), MenuError> {
        let word = self.ask("Enter the word:")?.trim().to_string();
        if word.is_empty() {
            self.say(Tag::Fail, "Unable to search empty strings. Please try again later.")?;
            return Ok(());
        }

        // Checked before building the client so cached words need no API key
        match self.index.lookup(&word) {
            Ok(Lookup::Hit(stored)) => return Ok(self.print_cached(&stored)?),
            Ok(Lookup::Miss) => {}
            Err(err) => {
                self.say(Tag::Fail, format!("Unable to read history: {}", err))?;
                return Ok(());
            }
        }

        let client = match self.wordnik_client()? {
            Some(client) => client,
            None => return Ok(()),
        };

        match self.index.search(&word, &client).await {
            Ok(SearchOutcome::Cached(stored)) => self.print_cached(&stored)?,
            Ok(SearchOutcome::Fetched { entry, cache_error }) => {
                self.say(Tag::Info, "showing online results")?;
                self.print_entry(&entry)?;
                if let Some(err) = cache_error {
                    self.say(Tag::Fail, format!("Unable to save '{}' to history: {}", word, err))?;
                }
            }
            Ok(SearchOutcome::NotFound) => self.say(Tag::Info, "No definitions found")?,
            Err(SearchError::Provider(ProviderError::RequestFailed(err))) if err.is_connect() => {
                self.say(Tag::Fail, "Please make sure you are connected to the internet")?
            }
            Err(err) => self.say(Tag::Fail, err)?,
        }
        Ok(())
    }

    /// Builds a Wordnik client from the stored key, reporting why if it can't
    fn wordnik_client(&mut self) -> Result<Option<WordnikClient>, MenuError> {
        if !self.ensure_credentials()? {
            return Ok(None);
        }
        let Some(credentials) = self.credentials.as_mut() else {
            return Ok(None);
        };

        match WordnikClient::from_credentials(credentials) {
            Ok(client) => Ok(Some(client)),
            Err(err) => {
                self.say(Tag::Fail, format!("{}. Add one from the Configure API key menu", err))?;
                Ok(None)
            }
        }
    }

    fn history(&mut self) -> Result<(), MenuError> {
        let mut words: Vec<String> = self.index.list().map(str::to_string).collect();
        if words.is_empty() {
            writeln!(self.output, "\n{}", "No history available".magenta())?;
            return Ok(());
        }

        words.sort();
        writeln!(self.output, "\n{}\n", "History -".magenta())?;
        for word in words {
            writeln!(self.output, "- {}", word)?;
        }
        Ok(())
    }

    fn remove_word(&mut self) -> Result<(), MenuError> {
        let word = self
            .ask("Enter the word to remove from history:")?
            .trim()
            .to_string();
        if word.is_empty() {
            self.say(Tag::Fail, "Unable to remove empty strings. Please try again later.")?;
            return Ok(());
        }

        match self.index.remove(&word) {
            Ok(()) => self.say(Tag::Done, format!("'{}' removed from history", word))?,
            Err(err) if err.is_not_found() => {
                self.say(Tag::Fail, format!("'{}' is not in history", word))?
            }
            Err(err) => self.say(
                Tag::Fail,
                format!("Couldn't remove '{}' from history: {}", word, err),
            )?,
        }
        Ok(())
    }

    fn clear_history(&mut self) -> Result<(), MenuError> {
        if !self.confirm("Do you really want to clear history and the cached results")? {
            self.say(Tag::Done, "History not cleared")?;
            return Ok(());
        }

        match self.index.remove_all() {
            Ok(summary) if summary.is_complete() => self.say(Tag::Done, "History cleared")?,
            Ok(summary) if summary.succeeded() => self.say(
                Tag::Fail,
                format!(
                    "Some items could not be removed from history ({} kept)",
                    summary.retained.len()
                ),
            )?,
            Ok(_) => self.say(Tag::Fail, "History could not be cleared")?,
            Err(err) => self.say(Tag::Fail, format!("Unable to save history: {}", err))?,
        }
        Ok(())
    }

    /// Opens the credential store on first use
    ///
    /// # Returns
    /// * `Ok(true)` once `self.credentials` is populated
    /// * `Ok(false)` if the store is unavailable; the reason was printed
    fn ensure_credentials(&mut self) -> Result<bool, MenuError> {
        if self.credentials.is_some() {
            return Ok(true);
        }

        match CredentialStore::open(&self.data_dir) {
            Ok(store) => {
                self.credentials = Some(store);
                Ok(true)
            }
            Err(err) if err.is_corrupted() => {
                self.say(Tag::Fail, format!("Unable to read keys: {}", err))?;
                if !self.confirm("Would you like to reset the file")? {
                    return Ok(false);
                }
                match CredentialStore::reset(&self.data_dir) {
                    Ok(store) => {
                        self.credentials = Some(store);
                        self.say(Tag::Done, "Repair successful")?;
                        Ok(true)
                    }
                    Err(err) => {
                        self.say(Tag::Fail, format!("Repair unsuccessful: {}", err))?;
                        Ok(false)
                    }
                }
            }
            Err(err) => {
                self.say(Tag::Fail, format!("Cannot read or create keys file: {}", err))?;
                Ok(false)
            }
        }
    }

    fn configure_key(&mut self) -> Result<(), MenuError> {
        if !self.ensure_credentials()? {
            return self.pause();
        }

        loop {
            writeln!(self.output, "\n\nManage Keys")?;
            writeln!(self.output, "-----------")?;
            let stored = self
                .with_credentials(|store| Ok(store.labels()))
                .unwrap_or_default();
            if stored.is_empty() {
                writeln!(self.output, "Stored keys: none")?;
            } else {
                let names: Vec<&str> = stored.iter().map(|label| label.display_name()).collect();
                writeln!(self.output, "Stored keys: {}", names.join(", "))?;
            }
            writeln!(self.output, "\n[1] Add/overwrite the Wordnik API key")?;
            writeln!(self.output, "\n[2] Remove the Wordnik API key")?;
            writeln!(self.output, "\n[3] Reveal the Wordnik API key")?;
            writeln!(self.output, "\n[0] Return to the previous menu")?;

            let line = self.ask("Please enter your choice:")?;
            let result = match parse_key_choice(&line) {
                Ok(KeyChoice::AddOrOverwrite) => {
                    let key = self.ask("Enter the API key for Wordnik:")?;
                    self.with_credentials(|store| store.set(ProviderLabel::Wordnik, &key))
                        .map(|()| "Key added successfully")
                }
                Ok(KeyChoice::Remove) => {
                    if self.confirm("Do you really want to remove the saved key")? {
                        self.with_credentials(|store| store.remove(ProviderLabel::Wordnik))
                            .map(|()| "Key removed successfully")
                    } else {
                        Ok("Key not removed")
                    }
                }
                Ok(KeyChoice::Reveal) => {
                    let key = self.with_credentials(|store| Ok(store.get(ProviderLabel::Wordnik)));
                    match key {
                        Ok(Some(key)) => {
                            self.say(Tag::Info, format!("Wordnik API Key = \"{}\"", key))?
                        }
                        _ => self.say(Tag::Info, "No Wordnik API key is stored")?,
                    }
                    self.pause()?;
                    continue;
                }
                Ok(KeyChoice::Back) => return Ok(()),
                Err(err) => {
                    self.say(Tag::Fail, format!("Please enter a valid choice ({})", err))?;
                    self.pause()?;
                    continue;
                }
            };

            match result {
                Ok(message) => self.say(Tag::Done, message)?,
                Err(StoreError::EmptySecret) => self.say(
                    Tag::Fail,
                    "Unable to add an empty API key. Please try again later.",
                )?,
                Err(err) if err.is_not_found() => {
                    self.say(Tag::Fail, "No Wordnik API key is stored")?
                }
                Err(err) => self.say(Tag::Fail, format!("Unable to update keys: {}", err))?,
            }
            self.pause()?;
        }
    }

    fn with_credentials<T>(
        &mut self,
        f: impl FnOnce(&mut CredentialStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match self.credentials.as_mut() {
            Some(store) => f(store),
            None => Err(StoreError::not_found(ProviderLabel::Wordnik.as_str())),
        }
    }
}
