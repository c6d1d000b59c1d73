//! Command table and help text.

use std::{collections::HashMap, sync::Arc};

use {futures::future::BoxFuture, tracing::debug};

use zbot_service_traits::{CodeHost, NoopCodeHost, NoopSymbolIndex, SymbolIndex};

use crate::{Error, Result};

/// Placeholder in usage strings replaced by the prefixed keyword.
pub const USAGE_PLACEHOLDER: &str = "<cmd>";

/// Collaborators available to command handlers.
#[derive(Clone)]
pub struct Services {
    pub code_host: Arc<dyn CodeHost>,
    pub symbols: Arc<dyn SymbolIndex>,
}

impl Services {
    pub fn new(code_host: Arc<dyn CodeHost>, symbols: Arc<dyn SymbolIndex>) -> Self {
        Self { code_host, symbols }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(Arc::new(NoopCodeHost), Arc::new(NoopSymbolIndex))
    }
}

/// Everything a handler sees for one invocation.
pub struct CommandContext<'a> {
    pub services: &'a Services,
    pub table: &'a CommandTable,
    pub prefix: char,
    pub channel: &'a str,
    pub user: &'a str,
    /// Whitespace-split tokens after the prefix; `args[0]` is the keyword.
    pub args: &'a [String],
}

impl CommandContext<'_> {
    /// Argument `n` after the keyword (1-based, matching `args`).
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.args.get(n).map(String::as_str)
    }

    /// Number of arguments after the keyword.
    pub fn extra_args(&self) -> usize {
        self.args.len().saturating_sub(1)
    }
}

/// A handler returns the reply for the originating channel, if any.
pub type HandlerFn = for<'a> fn(&'a CommandContext<'a>) -> BoxFuture<'a, Option<String>>;

/// One entry of the command table.
#[derive(Clone, Copy)]
pub struct Command {
    keyword: &'static str,
    usage: &'static str,
    min_args: usize,
    handler: HandlerFn,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("keyword", &self.keyword)
            .field("usage", &self.usage)
            .field("min_args", &self.min_args)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub const fn new(keyword: &'static str, usage: &'static str, handler: HandlerFn) -> Self {
        Self {
            keyword,
            usage,
            min_args: 0,
            handler,
        }
    }

    /// Guard the handler: an explicit invocation with fewer than `n`
    /// arguments after the keyword shows this command's usage instead of
    /// running it.
    #[must_use]
    pub const fn requires_args(mut self, n: usize) -> Self {
        self.min_args = n;
        self
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    pub fn usage(&self) -> &'static str {
        self.usage
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }
}

/// Immutable keyword → command mapping. Iteration follows registration order.
#[derive(Debug)]
pub struct CommandTable {
    commands: Vec<Command>,
    index: HashMap<&'static str, usize>,
}

impl CommandTable {
    pub fn builder() -> CommandTableBuilder {
        CommandTableBuilder::default()
    }

    /// Exact, case-sensitive keyword lookup.
    pub fn lookup(&self, keyword: &str) -> Option<&Command> {
        self.index.get(keyword).map(|&i| &self.commands[i])
    }

    /// Raw usage string (still containing the `<cmd>` placeholder).
    pub fn describe(&self, keyword: &str) -> Option<&'static str> {
        self.lookup(keyword).map(Command::usage)
    }

    /// Keywords in registration order.
    pub fn keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|c| c.keyword)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// `Available commands: a, b, c`
    pub fn help_listing(&self) -> String {
        let keywords: Vec<&str> = self.keywords().collect();
        format!("Available commands: {}", keywords.join(", "))
    }

    /// Usage for `keyword` with the placeholder replaced by the prefixed
    /// keyword, e.g. `Usage: !pr <number>`.
    pub fn help_detail(&self, keyword: &str, prefix: char) -> Option<String> {
        let command = self.lookup(keyword)?;
        Some(
            command
                .usage
                .replace(USAGE_PLACEHOLDER, &format!("{prefix}{}", command.keyword)),
        )
    }

    /// Run an explicit command. `args[0]` is the keyword.
    ///
    /// Unknown keywords and empty `args` yield `None`. A guarded command with
    /// too few arguments yields its usage text instead of running.
    pub async fn invoke(
        &self,
        services: &Services,
        prefix: char,
        channel: &str,
        user: &str,
        args: &[String],
    ) -> Option<String> {
        let command = self.lookup(args.first()?)?;
        let ctx = CommandContext {
            services,
            table: self,
            prefix,
            channel,
            user,
            args,
        };
        if ctx.extra_args() < command.min_args {
            debug!(
                keyword = command.keyword,
                needed = command.min_args,
                given = ctx.extra_args(),
                "missing arguments, showing usage"
            );
            return self.help_detail(command.keyword, prefix);
        }
        (command.handler)(&ctx).await
    }
}

/// Collects commands and freezes them into a [`CommandTable`].
#[derive(Default)]
pub struct CommandTableBuilder {
    commands: Vec<Command>,
}

impl CommandTableBuilder {
    #[must_use]
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    #[must_use]
    pub fn commands(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Fails on duplicate or malformed keywords.
    pub fn build(self) -> Result<CommandTable> {
        let mut index = HashMap::with_capacity(self.commands.len());
        for (i, command) in self.commands.iter().enumerate() {
            let keyword = command.keyword;
            if keyword.is_empty() {
                return Err(Error::InvalidKeyword {
                    keyword: keyword.into(),
                    reason: "empty",
                });
            }
            if keyword.chars().any(char::is_whitespace) {
                return Err(Error::InvalidKeyword {
                    keyword: keyword.into(),
                    reason: "contains whitespace",
                });
            }
            if index.insert(keyword, i).is_some() {
                return Err(Error::DuplicateKeyword {
                    keyword: keyword.into(),
                });
            }
        }
        Ok(CommandTable {
            commands: self.commands,
            index,
        })
    }
}
