//! Terminal application driving the payment flow.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent};
use futures_util::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::application::dto::{FlowView, OperatorCommand};
use crate::application::use_cases::{CancelHandle, PaymentFlowController};
use crate::domain::entities::FlowStepKind;
use crate::infrastructure::config::DemoRequestConfig;
use crate::infrastructure::session::InMemoryPairingSession;
use crate::presentation::events::{EventHandler, EventResult, KeyAction};
use crate::presentation::ui::PaymentScreen;

const REDRAW_TICK_RATE: Duration = Duration::from_millis(250);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// What a key press resolves to for the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Command(OperatorCommand),
    CancelCollection,
    PushRequest,
    ClearRequest,
    Quit,
}

impl Dispatch {
    fn resolve(action: KeyAction, view: &FlowView) -> Option<Self> {
        match action {
            KeyAction::Quit => return Some(Self::Quit),
            KeyAction::PushDemoRequest => return Some(Self::PushRequest),
            KeyAction::ClearRequest => return Some(Self::ClearRequest),
            KeyAction::Confirm if !view.is_active() => {
                return Some(Self::Command(OperatorCommand::Start));
            }
            _ if !view.is_active() => return None,
            _ => {}
        }

        let step = view.step;
        match action {
            KeyAction::Confirm => match step {
                FlowStepKind::Ready => Some(Self::Command(OperatorCommand::Confirm)),
                FlowStepKind::Complete | FlowStepKind::Cancelled => {
                    Some(Self::Command(OperatorCommand::Dismiss))
                }
                _ => None,
            },
            KeyAction::Cancel => match step {
                FlowStepKind::Creating | FlowStepKind::Collecting => Some(Self::CancelCollection),
                FlowStepKind::Ready | FlowStepKind::Error | FlowStepKind::Cancelled => {
                    Some(Self::Command(OperatorCommand::Cancel))
                }
                FlowStepKind::Processing | FlowStepKind::Complete => None,
            },
            KeyAction::Retry => matches!(step, FlowStepKind::Error | FlowStepKind::Cancelled)
                .then_some(Self::Command(OperatorCommand::Retry)),
            KeyAction::Dismiss => matches!(step, FlowStepKind::Complete | FlowStepKind::Cancelled)
                .then_some(Self::Command(OperatorCommand::Dismiss)),
            KeyAction::Quit | KeyAction::PushDemoRequest | KeyAction::ClearRequest => None,
        }
    }
}

/// Terminal UI bound to a payment flow controller.
pub struct App {
    controller: Option<PaymentFlowController>,
    worker: Option<JoinHandle<()>>,
    view: FlowView,
    views: watch::Receiver<FlowView>,
    cancel: CancelHandle,
    commands: mpsc::UnboundedSender<OperatorCommand>,
    command_rx: Option<mpsc::UnboundedReceiver<OperatorCommand>>,
    session: Arc<InMemoryPairingSession>,
    demo_request: DemoRequestConfig,
    requests_pushed: u32,
    exiting: bool,
}

impl App {
    /// Creates app; the controller starts when [`App::run`] is called.
    #[must_use]
    pub fn new(
        controller: PaymentFlowController,
        session: Arc<InMemoryPairingSession>,
        demo_request: DemoRequestConfig,
    ) -> Self {
        let views = controller.subscribe();
        let cancel = controller.cancel_handle();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let view = views.borrow().clone();

        Self {
            view,
            controller: Some(controller),
            worker: None,
            views,
            cancel,
            commands,
            command_rx: Some(command_rx),
            session,
            demo_request,
            requests_pushed: 0,
            exiting: false,
        }
    }

    /// Runs the UI until the operator quits.
    ///
    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        if let (Some(controller), Some(command_rx)) = (self.controller.take(), self.command_rx.take())
        {
            self.worker = Some(tokio::spawn(controller.run(command_rx)));
        }

        self.run_event_loop(terminal).await?;

        let Self {
            worker,
            view,
            cancel,
            commands,
            ..
        } = self;
        drop(commands);
        if let Some(mut worker) = worker {
            if view.step.is_busy() {
                cancel.request();
            }
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut worker).await.is_err() {
                warn!("Payment flow did not stop in time, aborting");
                worker.abort();
            }
        }
        info!("Terminal exiting normally");
        Ok(())
    }

    async fn run_event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();
        let mut redraw_interval = interval(REDRAW_TICK_RATE);

        terminal.draw(|frame| self.render(frame))?;

        while !self.exiting {
            tokio::select! {
                changed = self.views.changed() => {
                    if changed.is_err() {
                        warn!("Payment flow stopped");
                        self.exiting = true;
                        continue;
                    }
                    self.view = self.views.borrow_and_update().clone();
                    debug!(step = %self.view.step, exit = ?self.view.exit, "View updated");
                    terminal.draw(|frame| self.render(frame))?;
                }

                Some(Ok(event)) = terminal_events.next() => {
                    if self.handle_terminal_event(event) == EventResult::Exit {
                        self.exiting = true;
                    }
                    terminal.draw(|frame| self.render(frame))?;
                }

                _ = redraw_interval.tick() => {
                    terminal.draw(|frame| self.render(frame))?;
                }
            }
        }

        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        frame.render_widget(
            PaymentScreen::new(&self.view, self.session.terminal_name()),
            frame.area(),
        );
    }

    fn handle_terminal_event(&mut self, event: Event) -> EventResult {
        match event {
            Event::Key(key) => self.handle_key(&key),
            _ => EventResult::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventResult {
        let Some(action) = EventHandler::classify(key) else {
            return EventResult::Continue;
        };
        let Some(dispatch) = Dispatch::resolve(action, &self.view) else {
            debug!(?action, step = %self.view.step, "Key ignored in this step");
            return EventResult::Continue;
        };

        match dispatch {
            Dispatch::Quit => return EventResult::Exit,
            Dispatch::Command(command) => {
                if self.commands.send(command).is_err() {
                    warn!(%command, "Payment flow is not running");
                }
            }
            Dispatch::CancelCollection => {
                info!("Operator requested cancellation");
                self.cancel.request();
            }
            Dispatch::PushRequest => self.push_demo_request(),
            Dispatch::ClearRequest => self.session.clear(),
        }
        EventResult::Continue
    }

    fn push_demo_request(&mut self) {
        self.requests_pushed += 1;
        let id = format!("sim-{}", self.requests_pushed);
        match self.demo_request.to_request(id) {
            Ok(request) => self.session.push_request(request),
            Err(error) => warn!(error = %error, "Cannot build simulated request"),
        }
    }
}
