//! # Commands and Messages
//!
//! Everything that reaches the navigator is a [`Message`]: terminal input,
//! results of background work, navigation requests. Screens never do slow
//! work in `update`; they return a [`Command`] describing it and the run
//! loop executes it on the tokio runtime.
//!
//! ## Ordering
//!
//! - Messages are handled strictly in the order they arrive on the channel.
//! - `Sequence` starts step N+1 only after step N's message (if any) has been
//!   sent. Every step runs, even when an earlier one produced an error or
//!   was cancelled, so `Sequence(loading, work, loaded)` always clears the
//!   loading indicator.
//! - `Batch` gives no relative ordering at all.
//!
//! ## Cancellation
//!
//! Work created with [`Command::perform`] is bound to a [`WorkContext`].
//! When the navigator cancels that context the work is dropped and yields no
//! message. Cancellation is never an error.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, mpsc};

use crossterm::event::KeyEvent;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use log::{debug, warn};
use ratatui::layout::Size;
use tokio::sync::watch;

use crate::client::ClientError;
use crate::core::error::AppError;
use crate::tui::notification::Notification;
use crate::tui::screen::Screen;

/// Where a back navigation should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    /// Pop this many screens.
    Steps(usize),
    /// Pop until the active screen is not intermediate.
    Durable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

pub enum Message {
    Key(KeyEvent),
    Paste(String),
    Resize(Size),
    Quit,
    Notify(Notification),
    NotificationExpired(u64),
    Loading(String),
    Loaded,
    Navigate(Box<dyn Screen>),
    Back(BackTarget),
    Home,
    /// Delivered to a screen that became active again after a back or home.
    Restored,
    ShowViewport {
        title: String,
        content: String,
    },
    ShowLog,
    Confirm(Confirmation),
    Error(AppError),
    /// Screen-specific payload. Screens downcast it and ignore what they
    /// don't recognise.
    Custom(Box<dyn Any + Send>),
}

impl Message {
    pub fn custom<T: Any + Send>(payload: T) -> Self {
        Message::Custom(Box::new(payload))
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Message::Paste(text) => f.debug_tuple("Paste").field(&text.len()).finish(),
            Message::Resize(size) => f.debug_tuple("Resize").field(size).finish(),
            Message::Quit => write!(f, "Quit"),
            Message::Notify(n) => f.debug_tuple("Notify").field(&n.text).finish(),
            Message::NotificationExpired(g) => {
                f.debug_tuple("NotificationExpired").field(g).finish()
            }
            Message::Loading(text) => f.debug_tuple("Loading").field(text).finish(),
            Message::Loaded => write!(f, "Loaded"),
            Message::Navigate(screen) => {
                f.debug_tuple("Navigate").field(&screen.title().text).finish()
            }
            Message::Back(target) => f.debug_tuple("Back").field(target).finish(),
            Message::Home => write!(f, "Home"),
            Message::Restored => write!(f, "Restored"),
            Message::ShowViewport { title, .. } => {
                f.debug_struct("ShowViewport").field("title", title).finish()
            }
            Message::ShowLog => write!(f, "ShowLog"),
            Message::Confirm(c) => f.debug_tuple("Confirm").field(c).finish(),
            Message::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Message::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Cancellation token shared by the commands of one navigation step.
#[derive(Debug, Clone)]
pub struct WorkContext {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for WorkContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkContext {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let observed = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !observed {
            // Sender gone: nobody can cancel any more
            std::future::pending::<()>().await;
        }
    }
}

/// A deferred unit of work yielding at most one [`Message`].
#[derive(Default)]
pub enum Command {
    #[default]
    None,
    /// A message that is ready now.
    Message(Message),
    Perform(BoxFuture<'static, Option<Message>>),
    Sequence(Vec<Command>),
    Batch(Vec<Command>),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::None => write!(f, "None"),
            Command::Message(msg) => f.debug_tuple("Message").field(msg).finish(),
            Command::Perform(_) => write!(f, "Perform(..)"),
            Command::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Command::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
        }
    }
}

impl From<Message> for Command {
    fn from(msg: Message) -> Self {
        Command::Message(msg)
    }
}

impl Command {
    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }

    /// Runs `work` until it completes or `ctx` is cancelled.
    ///
    /// A result that arrives after cancellation is discarded too, so an
    /// abandoned screen's work never reaches the screen that replaced it.
    pub fn perform<F>(ctx: &WorkContext, work: F) -> Self
    where
        F: Future<Output = Option<Message>> + Send + 'static,
    {
        let ctx = ctx.clone();
        Command::Perform(
            async move {
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        debug!("Command dropped: work context cancelled");
                        None
                    }
                    msg = work => if ctx.is_cancelled() { None } else { msg },
                }
            }
            .boxed(),
        )
    }

    /// Like [`Command::perform`] for fallible client work: `Ok` goes through
    /// `on_ok`, cancellation yields nothing, any other error becomes
    /// [`Message::Error`].
    pub fn attempt<T, F, M>(ctx: &WorkContext, work: F, on_ok: M) -> Self
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
        M: FnOnce(T) -> Option<Message> + Send + 'static,
    {
        Self::perform(ctx, async move {
            match work.await {
                Ok(value) => on_ok(value),
                Err(ClientError::Cancelled) => None,
                Err(e) => {
                    warn!("Command failed: {e}");
                    Some(Message::Error(e.into()))
                }
            }
        })
    }

    pub fn notify(text: impl Into<String>) -> Self {
        Command::Message(Message::Notify(Notification::new(text)))
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Command::Message(Message::Loading(text.into()))
    }

    pub fn loaded() -> Self {
        Command::Message(Message::Loaded)
    }

    pub fn navigate(screen: impl Screen + 'static) -> Self {
        Command::Message(Message::Navigate(Box::new(screen)))
    }

    pub fn back() -> Self {
        Command::Message(Message::Back(BackTarget::Steps(1)))
    }

    /// Ordered steps. `None` steps are dropped.
    pub fn sequence(cmds: impl IntoIterator<Item = Command>) -> Self {
        let mut cmds: Vec<Command> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Command::None,
            1 => cmds.remove(0),
            _ => Command::Sequence(cmds),
        }
    }

    /// Independent commands. `None` entries are dropped.
    pub fn batch(cmds: impl IntoIterator<Item = Command>) -> Self {
        let mut cmds: Vec<Command> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Command::None,
            1 => cmds.remove(0),
            _ => Command::Batch(cmds),
        }
    }
}

fn deliver(tx: &mpsc::Sender<Message>, msg: Message) {
    if tx.send(msg).is_err() {
        warn!("Dropping message: event loop receiver is gone");
    }
}

/// Runs `cmd` to completion, sending produced messages through `tx`.
pub fn execute(cmd: Command, tx: mpsc::Sender<Message>) -> BoxFuture<'static, ()> {
    async move {
        match cmd {
            Command::None => {}
            Command::Message(msg) => deliver(&tx, msg),
            Command::Perform(work) => {
                if let Some(msg) = work.await {
                    deliver(&tx, msg);
                }
            }
            Command::Sequence(steps) => {
                for step in steps {
                    execute(step, tx.clone()).await;
                }
            }
            Command::Batch(cmds) => {
                join_all(cmds.into_iter().map(|cmd| execute(cmd, tx.clone()))).await;
            }
        }
    }
    .boxed()
}

/// Hands `cmd` to the runtime without waiting for it.
///
/// Ready messages are sent straight away; anything else is spawned. Must be
/// called from within a tokio runtime.
pub fn spawn(cmd: Command, tx: &mpsc::Sender<Message>) {
    match cmd {
        Command::None => {}
        Command::Message(msg) => deliver(tx, msg),
        other => {
            tokio::spawn(execute(other, tx.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn drain(rx: &mpsc::Receiver<Message>) -> Vec<Message> {
        rx.try_iter().collect()
    }

    #[tokio::test]
    async fn test_sequence_runs_final_step_after_error() {
        let ctx = WorkContext::new();
        let (tx, rx) = mpsc::channel();
        let work = Command::attempt(
            &ctx,
            async { Err::<(), _>(ClientError::Other("boom".into())) },
            |_| None,
        );
        execute(
            Command::sequence([Command::loading("Working"), work, Command::loaded()]),
            tx,
        )
        .await;

        let msgs = drain(&rx);
        assert_eq!(msgs.len(), 3);
        assert!(matches!(msgs[0], Message::Loading(_)));
        assert!(matches!(msgs[1], Message::Error(_)));
        assert!(matches!(msgs[2], Message::Loaded));
    }

    #[tokio::test]
    async fn test_sequence_waits_for_slow_step() {
        let ctx = WorkContext::new();
        let (tx, rx) = mpsc::channel();
        let slow = Command::perform(&ctx, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Some(Message::Notify(Notification::new("slow")))
        });
        execute(Command::sequence([slow, Command::notify("fast")]), tx).await;

        let texts: Vec<String> = drain(&rx)
            .into_iter()
            .filter_map(|m| match m {
                Message::Notify(n) => Some(n.text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_cancelled_work_yields_nothing() {
        let ctx = WorkContext::new();
        let (tx, rx) = mpsc::channel();
        let pending = Command::perform(&ctx, async {
            std::future::pending::<()>().await;
            Some(Message::Quit)
        });
        let handle = tokio::spawn(execute(pending, tx));
        ctx.cancel();
        handle.await.unwrap();
        assert!(drain(&rx).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_client_error_is_not_an_error() {
        let ctx = WorkContext::new();
        let (tx, rx) = mpsc::channel();
        let cmd = Command::attempt(
            &ctx,
            async { Err::<(), _>(ClientError::Cancelled) },
            |_| Some(Message::Quit),
        );
        execute(Command::sequence([cmd, Command::loaded()]), tx).await;
        let msgs = drain(&rx);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Message::Loaded));
    }

    #[tokio::test]
    async fn test_batch_runs_everything() {
        let (tx, rx) = mpsc::channel();
        execute(
            Command::batch([Command::notify("a"), Command::None, Command::notify("b")]),
            tx,
        )
        .await;
        assert_eq!(drain(&rx).len(), 2);
    }

    #[test]
    fn test_combinators_collapse_trivial_cases() {
        assert!(Command::sequence([]).is_none());
        assert!(Command::batch([Command::None, Command::None]).is_none());
        assert!(matches!(
            Command::sequence([Command::None, Command::loaded()]),
            Command::Message(Message::Loaded)
        ));
    }

    #[test]
    fn test_context_cancel_is_visible_to_clones() {
        let ctx = WorkContext::new();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        ctx.cancel();
        assert!(clone.is_cancelled());
    }
}
