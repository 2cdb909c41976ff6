/// External-command move oracle.
///
/// Each query spawns the configured program, writes the facts of the move
/// to its stdin and reads a verdict from its stdout. The child gets at most
/// `timeout` to answer; after that it is killed and reaped. Nothing touches
/// the filesystem.
///
/// ## Wire format
///
/// Request (one fact per line):
///
/// ```text
/// grid <rows> <cols>
/// current <row> <col>
/// candidate <row> <col>
/// obstacle <row> <col>          (one line per obstacle)
/// clue <kind> <row> <col>       (kind: item_clue | obstacle_clue | exit_clue | adversary_clue)
/// end
/// ```
///
/// Reply: a line `legal` or `illegal`, optionally a line
/// `suggest <row> <col>`. Blank lines and lines starting with `#` are ignored.

use std::fmt::Write as _;
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::OracleConfig;
use crate::domain::entity::Position;
use crate::domain::rules::{MoveOracle, OracleQuery, Verdict};
use crate::error::OracleError;

const POLL_INTERVAL: Duration = Duration::from_millis(2);

pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandOracle {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        CommandOracle { program: program.into(), args, timeout }
    }

    pub fn from_config(cfg: &OracleConfig) -> Self {
        CommandOracle::new(cfg.command.clone(), cfg.args.clone(), cfg.timeout)
    }

    fn run(&self, request: &str) -> Result<String, OracleError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn { program: self.program.clone(), source })?;

        let deadline = Instant::now() + self.timeout;
        match self.exchange(&mut child, request, deadline) {
            Ok(out) => Ok(out),
            Err(e) => {
                // Never leave a child behind.
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    fn exchange(&self, child: &mut Child, request: &str, deadline: Instant) -> Result<String, OracleError> {
        // Both pipes are serviced on helper threads so that a child which
        // never reads its input cannot hold us past the deadline. Killing
        // the child closes the pipes and lets the threads finish.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OracleError::Malformed("stdin not captured".into()))?;
        let request = request.to_owned();
        let (wtx, wrx) = mpsc::channel();
        thread::spawn(move || {
            let res = match stdin.write_all(request.as_bytes()) {
                // The oracle may answer without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            };
            // stdin dropped here: the child sees EOF.
            let _ = wtx.send(res);
        });

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::Malformed("stdout not captured".into()))?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = String::new();
            let res = stdout.read_to_string(&mut buf).map(|_| buf);
            let _ = tx.send(res);
        });

        let output = match rx.recv_timeout(remaining(deadline)) {
            Ok(res) => res?,
            Err(_) => return Err(OracleError::Timeout(self.timeout)),
        };
        match wrx.recv_timeout(remaining(deadline)) {
            Ok(res) => res?,
            Err(_) => return Err(OracleError::Timeout(self.timeout)),
        }

        // stdout is closed; give the process the rest of the budget to exit.
        loop {
            if let Some(status) = child.try_wait()? {
                if !status.success() {
                    return Err(OracleError::Failed(status.to_string()));
                }
                return Ok(output);
            }
            if Instant::now() >= deadline {
                return Err(OracleError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

impl MoveOracle for CommandOracle {
    fn judge(&self, query: &OracleQuery<'_>) -> Result<Verdict, OracleError> {
        let started = Instant::now();
        let reply = self.run(&render_query(query))?;
        let verdict = parse_reply(&reply)?;
        debug!(
            candidate = %query.candidate,
            legal = verdict.legal,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "oracle verdict"
        );
        Ok(verdict)
    }
}

// ── Wire format ──

pub fn render_query(query: &OracleQuery<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "grid {} {}", query.bounds.rows, query.bounds.cols);
    let _ = writeln!(out, "current {} {}", query.current.row, query.current.col);
    let _ = writeln!(out, "candidate {} {}", query.candidate.row, query.candidate.col);
    for p in query.obstacles {
        let _ = writeln!(out, "obstacle {} {}", p.row, p.col);
    }
    for (feature, p) in &query.clues {
        let _ = writeln!(out, "clue {} {} {}", feature.clue_name(), p.row, p.col);
    }
    out.push_str("end\n");
    out
}

pub fn parse_reply(reply: &str) -> Result<Verdict, OracleError> {
    let mut legal: Option<bool> = None;
    let mut suggestion = None;

    for line in reply.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        match words.next() {
            Some("legal") if legal.is_none() => legal = Some(true),
            Some("illegal") if legal.is_none() => legal = Some(false),
            Some("suggest") => {
                let row = words.next().and_then(|w| w.parse::<i32>().ok());
                let col = words.next().and_then(|w| w.parse::<i32>().ok());
                match (row, col, words.next()) {
                    (Some(r), Some(c), None) => suggestion = Some(Position::new(r, c)),
                    _ => return Err(OracleError::Malformed(format!("bad suggestion `{line}`"))),
                }
            }
            _ => return Err(OracleError::Malformed(format!("unexpected line `{line}`"))),
        }
    }

    match legal {
        // A suggestion only means something alongside a veto.
        Some(true) => Ok(Verdict::legal()),
        Some(false) => Ok(Verdict::illegal(suggestion)),
        None => Err(OracleError::Malformed("no legal/illegal line".into())),
    }
}
