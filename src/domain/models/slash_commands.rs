#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }

        let prefix = args.remove(0);
        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit() || cmd.is_focus() || cmd.is_close() || cmd.is_reset() || cmd.is_help() {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_focus(&self) -> bool {
        return ["/f", "/focus", "/graph"].contains(&self.command.as_str());
    }

    pub fn is_close(&self) -> bool {
        return ["/x", "/close"].contains(&self.command.as_str());
    }

    pub fn is_reset(&self) -> bool {
        return ["/reset", "/clear"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    /// First argument parsed as a message number, if one was given.
    pub fn index_arg(&self) -> Option<usize> {
        return self.args.first().and_then(|arg| return arg.parse::<usize>().ok());
    }
}
