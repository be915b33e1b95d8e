//! Interactive access-list menu
//!
//! ```text
//! Menu:               Edit <name>:
//! 1. View ACLs        1. View all Rules
//! 2. Add new ACLs     2. Edit existing rule
//! 3. Edit ACLs        3. Add new rule
//! 4. Delete ACL       4. Delete rule
//! 5. Exit             5. Back to Main Menu
//! ```
//!
//! Every choice is parsed into [`MainChoice`] or [`EditChoice`] before it is
//! dispatched. Switch errors are printed and the menu carries on; only a
//! console failure or end of input leaves the loop.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::{debug, warn};

use super::{AclEditor, AclError, AclResult, parse_rules, parse_sequence};

const MAIN_MENU: &str =
    "Menu: \n1. View ACLs\n2. Add new ACLs\n3. Edit ACLs\n4. Delete ACL\n5. Exit\n";
const EDIT_MENU: &str = "\n1. View all Rules\n2. Edit existing rule\n3. Add new rule\n4. Delete rule\n5. Back to Main Menu\n";
const CHOICE_PROMPT: &str = "Enter Menu Number to proceed: ";

/// A menu entry that does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChoice(pub String);

impl fmt::Display for InvalidChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid Input, try again")
    }
}

impl std::error::Error for InvalidChoice {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    View,
    Add,
    Edit,
    Delete,
    Exit,
}

impl FromStr for MainChoice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MainChoice::View),
            "2" => Ok(MainChoice::Add),
            "3" => Ok(MainChoice::Edit),
            "4" => Ok(MainChoice::Delete),
            "5" => Ok(MainChoice::Exit),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditChoice {
    ViewRules,
    EditRule,
    AddRules,
    DeleteRule,
    Back,
}

impl FromStr for EditChoice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(EditChoice::ViewRules),
            "2" => Ok(EditChoice::EditRule),
            "3" => Ok(EditChoice::AddRules),
            "4" => Ok(EditChoice::DeleteRule),
            "5" => Ok(EditChoice::Back),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

/// Whether `address` is one of the switches the editor may touch.
pub fn switch_allowed(allowed: &[String], address: &str) -> bool {
    allowed.iter().any(|s| s == address.trim())
}

/// Line oriented prompt/answer console
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: impl fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Print `text` and read one line. `None` once input is exhausted.
    pub fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

enum Flow {
    Continue,
    Quit,
}

pub struct Menu<'a, R, W> {
    editor: &'a AclEditor,
    console: Console<R, W>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(editor: &'a AclEditor, console: Console<R, W>) -> Self {
        Self { editor, console }
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Print the outcome of a switch operation; console errors propagate.
    fn report(&mut self, result: AclResult<String>) -> AclResult<()> {
        match result {
            Ok(message) => self.console.say(message)?,
            Err(AclError::Io(e)) => return Err(AclError::Io(e)),
            Err(e) => {
                warn!("ACL operation failed: {e}");
                self.console.say(e)?;
            }
        }
        Ok(())
    }

    pub async fn run(&mut self) -> AclResult<()> {
        self.console.say("--- ACL Editor ---")?;

        loop {
            self.console.say(MAIN_MENU)?;
            let Some(input) = self.console.prompt(CHOICE_PROMPT)? else {
                debug!("input closed");
                return Ok(());
            };

            let choice = match input.parse::<MainChoice>() {
                Ok(choice) => choice,
                Err(e) => {
                    self.console.say(e)?;
                    continue;
                }
            };

            let flow = match choice {
                MainChoice::View => self.view_acls().await?,
                MainChoice::Add => self.add_acl().await?,
                MainChoice::Edit => self.edit_acl().await?,
                MainChoice::Delete => self.delete_acl().await?,
                MainChoice::Exit => {
                    self.console.say("--- Exiting ACL Editor ---")?;
                    Flow::Quit
                }
            };

            if let Flow::Quit = flow {
                return Ok(());
            }
        }
    }

    async fn view_acls(&mut self) -> AclResult<Flow> {
        match self.editor.list().await {
            Ok(acls) => {
                for acl in acls {
                    self.console.say(&acl.name)?;
                    for rule in &acl.rules {
                        self.console
                            .say(format!("  {} : {}", rule.sequence_number, rule.text))?;
                    }
                }
            }
            Err(e) => self.report(Err(e))?,
        }
        Ok(Flow::Continue)
    }

    async fn add_acl(&mut self) -> AclResult<Flow> {
        let Some(name) = self.console.prompt("Enter name of new ACL: \n")? else {
            return Ok(Flow::Quit);
        };
        let Some(rules) = self
            .console
            .prompt("Enter new ACL rules separated by commas: ")?
        else {
            return Ok(Flow::Quit);
        };

        let name = name.trim();
        let result = self
            .editor
            .add_rules(name, &parse_rules(&rules))
            .await
            .map(|_| format!("Added ACL: {name}"));
        self.report(result)?;
        Ok(Flow::Continue)
    }

    async fn delete_acl(&mut self) -> AclResult<Flow> {
        let Some(name) = self.console.prompt("Enter name of ACL to delete: ")? else {
            return Ok(Flow::Quit);
        };

        let name = name.trim();
        let result = self
            .editor
            .delete_acl(name)
            .await
            .map(|_| format!("Removed ACL: {name}"));
        self.report(result)?;
        Ok(Flow::Continue)
    }

    async fn edit_acl(&mut self) -> AclResult<Flow> {
        let Some(name) = self.console.prompt("Enter name of ACL to edit: ")? else {
            return Ok(Flow::Quit);
        };
        let name = name.trim().to_string();

        if let Err(e) = self.editor.find(&name).await {
            self.report(Err(e))?;
            return Ok(Flow::Continue);
        }

        loop {
            self.console.say(EDIT_MENU)?;
            let Some(input) = self.console.prompt(CHOICE_PROMPT)? else {
                return Ok(Flow::Quit);
            };

            let choice = match input.parse::<EditChoice>() {
                Ok(choice) => choice,
                Err(e) => {
                    self.console.say(e)?;
                    continue;
                }
            };

            match choice {
                EditChoice::ViewRules => match self.editor.find(&name).await {
                    Ok(acl) => {
                        self.console.say("Existing rules: \n")?;
                        for rule in &acl.rules {
                            self.console
                                .say(format!("{} : {}", rule.sequence_number, rule.text))?;
                        }
                    }
                    Err(e) => self.report(Err(e))?,
                },
                EditChoice::EditRule => {
                    let Some(sequence) = self.console.prompt("Enter rule sequence to edit: ")?
                    else {
                        return Ok(Flow::Quit);
                    };
                    let Some(rule) = self.console.prompt("Enter new rule: ")? else {
                        return Ok(Flow::Quit);
                    };

                    let result = match parse_sequence(&sequence) {
                        Ok(sequence) => self
                            .editor
                            .replace_rule(&name, sequence, &rule)
                            .await
                            .map(|_| format!("Edited ACL: {name}")),
                        Err(e) => Err(e),
                    };
                    self.report(result)?;
                }
                EditChoice::AddRules => {
                    let Some(rules) = self
                        .console
                        .prompt("Enter new ACL rules separated by commas: ")?
                    else {
                        return Ok(Flow::Quit);
                    };

                    let result = self
                        .editor
                        .add_rules(&name, &parse_rules(&rules))
                        .await
                        .map(|_| format!("Edited ACL: {name}"));
                    self.report(result)?;
                }
                EditChoice::DeleteRule => {
                    let Some(sequence) = self.console.prompt("Enter rule sequence to delete: ")?
                    else {
                        return Ok(Flow::Quit);
                    };

                    let result = match parse_sequence(&sequence) {
                        Ok(sequence) => self
                            .editor
                            .delete_rule(&name, sequence)
                            .await
                            .map(|_| format!("Edited ACL: {name} Deleted rule: {sequence}")),
                        Err(e) => Err(e),
                    };
                    self.report(result)?;
                }
                EditChoice::Back => {
                    self.console.say("--- Back to Main Menu ---")?;
                    return Ok(Flow::Continue);
                }
            }
        }
    }
}
