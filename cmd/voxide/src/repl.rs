//! Input loops: batch stdin, the interactive editor, and network mode.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use voxide_engine::{BehaviorHost, Printer, World};

use crate::command;

#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error("cannot bind 0.0.0.0:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("line editor failed: {0}")]
    Editor(String),
}

/// Parse and execute one input line; errors go to the error sink and the
/// session continues.
fn drive_line(line: &str, world: &mut World, host: &dyn BehaviorHost, printer: &mut dyn Printer) {
    match command::parse(line) {
        Ok(Some(parsed)) => command::execute(parsed, world, host, printer),
        Ok(None) => {}
        Err(error) => printer.err(format_args!("{error}\n")),
    }
}

/// Drive commands from stdin until EOF.
pub fn run_stdin(world: &mut World, host: &dyn BehaviorHost, printer: &mut dyn Printer) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => drive_line(&line, world, host, printer),
            Err(error) => {
                tracing::warn!(%error, "trouble reading stdin");
                break;
            }
        }
    }
}

/// Drive commands from a line editor with history until EOF or interrupt.
pub fn run_interactive(
    world: &mut World,
    host: &dyn BehaviorHost,
    printer: &mut dyn Printer,
) -> Result<(), ReplError> {
    let config = Config::builder().auto_add_history(true).build();
    let mut editor: Editor<(), DefaultHistory> =
        Editor::with_config(config).map_err(|error| ReplError::Editor(error.to_string()))?;

    loop {
        match editor.readline("> ") {
            Ok(line) => drive_line(&line, world, host, printer),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => {
                printer.err(format_args!("Readline error: {error}\n"));
                break;
            }
        }
    }

    Ok(())
}

/// Both output streams of a network session share the client socket.
pub struct SocketPrinter {
    stream: TcpStream,
}

impl SocketPrinter {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(error) = self.stream.write_all(args.to_string().as_bytes()) {
            tracing::warn!(%error, "trouble writing to socket");
        }
    }
}

impl Printer for SocketPrinter {
    fn out(&mut self, args: std::fmt::Arguments<'_>) {
        self.write(args);
    }

    fn err(&mut self, args: std::fmt::Arguments<'_>) {
        self.write(args);
    }
}

/// Serve commands over TCP: one client at a time, each driven until its
/// connection closes, then accept the next.
pub fn run_network(
    world: &mut World,
    host: &dyn BehaviorHost,
    port: u16,
) -> Result<(), ReplError> {
    let listener =
        TcpListener::bind(("0.0.0.0", port)).map_err(|source| ReplError::Bind { port, source })?;
    println!("Listening on 0.0.0.0:{port}");

    loop {
        let stream = match listener.accept() {
            Ok((stream, peer)) => {
                tracing::info!(%peer, "client connected");
                stream
            }
            Err(error) => {
                tracing::warn!(%error, "trouble accepting connection");
                continue;
            }
        };

        let reader = match stream.try_clone() {
            Ok(clone) => BufReader::new(clone),
            Err(error) => {
                tracing::warn!(%error, "cannot clone client socket");
                continue;
            }
        };
        let mut printer = SocketPrinter::new(stream);

        for line in reader.lines() {
            match line {
                Ok(line) => drive_line(&line, world, host, &mut printer),
                Err(error) => {
                    tracing::warn!(%error, "trouble reading from socket");
                    break;
                }
            }
        }
        tracing::info!("client disconnected");
    }
}
