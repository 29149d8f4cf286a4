use std::io::{self, IsTerminal, Write};
use std::process::{Child, Command, Stdio};

/// Print output directly, or through `$PAGER` (default `less -R`) when
/// stdout is a terminal and the output would scroll past it.
pub fn print_with_pager(output: &str) -> io::Result<()> {
    if !io::stdout().is_terminal() || fits_on_screen(output) {
        println!("{output}");
        return Ok(());
    }

    let Some(mut child) = spawn_pager() else {
        println!("{output}");
        return Ok(());
    };

    if let Some(mut stdin) = child.stdin.take() {
        let _ = writeln!(stdin, "{output}");
    }
    let _ = child.wait();
    Ok(())
}

fn fits_on_screen(output: &str) -> bool {
    let (_, term_height) = crossterm::terminal::size().unwrap_or((80, 24));
    output.lines().count() <= term_height as usize
}

fn spawn_pager() -> Option<Child> {
    let pager = std::env::var("PAGER")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "less -R".into());

    let mut parts = pager.split_whitespace();
    let cmd = parts.next()?;
    Command::new(cmd)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn()
        .ok()
}
