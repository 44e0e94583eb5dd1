use sysdash::{ChartType, Command, HistorySeries, Theme};

pub const HELP: &str = "\
commands:
  r | refresh          refresh now
  p | processes        refresh the process table
  a | auto             toggle auto refresh
  i | interval <secs>  set refresh interval
  x | resolve <id>     resolve an alert
  t | theme <name>     default, dark, green or purple
  c | chart <type>     line, bar or area
  d | dark             toggle dark mode (saved)
  cpu|ram|disk <pct>   set alert threshold
  notify on|off        desktop notifications
  sound on|off         notification sound
  anim on|off          animated refresh indicator
  n | notifications    list active alerts
  s | save             save settings
  reset                reset settings to defaults
  q | quit             exit";

/// Parses one line of user input. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let command = match verb.to_lowercase().as_str() {
        "r" | "refresh" => Command::Refresh,
        "p" | "processes" => Command::RefreshProcesses,
        "a" | "auto" => Command::ToggleAutoRefresh,
        "i" | "interval" => Command::SetInterval(parse_number(arg, "interval")?),
        "x" | "resolve" => Command::ResolveAlert(parse_number(arg, "alert id")?),
        "t" | "theme" => Command::SetTheme(
            arg.ok_or("theme needs a name")?.parse::<Theme>()?,
        ),
        "c" | "chart" => Command::SetChartType(
            arg.ok_or("chart needs a type")?.parse::<ChartType>()?,
        ),
        "d" | "dark" => Command::ToggleDarkMode,
        "cpu" => Command::SetThreshold(HistorySeries::Cpu, parse_number(arg, "threshold")?),
        "ram" => Command::SetThreshold(HistorySeries::Ram, parse_number(arg, "threshold")?),
        "disk" => Command::SetThreshold(HistorySeries::Disk, parse_number(arg, "threshold")?),
        "notify" => Command::SetNotifications(parse_switch(arg)?),
        "sound" => Command::SetSounds(parse_switch(arg)?),
        "anim" | "animations" => Command::SetAnimations(parse_switch(arg)?),
        "n" | "notifications" => Command::ShowNotifications,
        "s" | "save" => Command::SaveSettings,
        "reset" => Command::ResetSettings,
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" | "?" => return Err(HELP.to_string()),
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<T, String> {
    arg.ok_or_else(|| format!("missing {what}"))?
        .parse()
        .map_err(|_| format!("invalid {what}"))
}

fn parse_switch(arg: Option<&str>) -> Result<bool, String> {
    match arg.map(str::to_lowercase).as_deref() {
        Some("on") | Some("true") | Some("1") => Ok(true),
        Some("off") | Some("false") | Some("0") => Ok(false),
        _ => Err("expected on or off".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_with_arguments() {
        assert_eq!(parse_command("i 5"), Ok(Some(Command::SetInterval(5))));
        assert_eq!(parse_command("resolve 42"), Ok(Some(Command::ResolveAlert(42))));
        assert_eq!(
            parse_command("theme Purple"),
            Ok(Some(Command::SetTheme(Theme::Purple)))
        );
        assert_eq!(
            parse_command("disk 80"),
            Ok(Some(Command::SetThreshold(HistorySeries::Disk, 80)))
        );
        assert_eq!(
            parse_command("chart bar"),
            Ok(Some(Command::SetChartType(ChartType::Bar)))
        );
        assert_eq!(parse_command("p"), Ok(Some(Command::RefreshProcesses)));
        assert_eq!(
            parse_command("anim off"),
            Ok(Some(Command::SetAnimations(false)))
        );
        assert_eq!(
            parse_command("notify off"),
            Ok(Some(Command::SetNotifications(false)))
        );
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse_command("interval soon").is_err());
        assert!(parse_command("x").is_err());
        assert!(parse_command("theme neon").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}
