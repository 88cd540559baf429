//! The first-step gate, the active run and the wind-down.

use std::mem;

use chatplays_core::directive::{DetonateArgs, Directive, Rotation, Suspend};
use chatplays_core::error::HandlerFault;
use chatplays_core::handler::StepStream;
use chatplays_core::identity::Identity;
use futures::StreamExt;
use tracing::debug;

use crate::application::solver::{ModuleSolver, lock};
use crate::domain::outcome::DispatchOutcome;

/// Modules whose camera turns with the bomb face.
const CAMERA_FOLLOWS_ROTATION: &[&str] = &["spwizPerspectivePegs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl ModuleSolver {
    /// Starts the handler and checks its first step before committing to a
    /// run.
    pub(crate) async fn dispatch(&self, identity: &Identity, text: &str) -> DispatchOutcome {
        let strikes_before = self.strike_count();
        let steps = match self.handler.respond(text) {
            Ok(steps) => steps,
            Err(fault) => {
                self.handle_fault(fault).await;
                return DispatchOutcome::Faulted;
            }
        };

        // A declined command and an empty sequence both leave `None` here.
        let steps = match steps {
            Some(mut steps) => match steps.next().await {
                Some(Ok(_acknowledged)) => Some(steps),
                Some(Err(fault)) => {
                    self.handle_fault(fault).await;
                    return DispatchOutcome::Faulted;
                }
                None => None,
            },
            None => None,
        };
        if steps.is_some() && self.descriptor.does_the_right_thing {
            self.with_session(|session| session.responded = true);
        }
        self.process_events();

        let solved = self.module.is_solved();
        let struck = self.strike_count() != strikes_before;
        if solved || struck {
            self.courtesy_focus().await;
            return DispatchOutcome::Courtesy;
        }
        let Some(steps) = steps else {
            self.ctx.chat.command_invalid(identity);
            return DispatchOutcome::Unrecognized;
        };

        self.run(identity, steps).await
    }

    async fn courtesy_focus(&self) {
        self.ctx.bomb.focus(&self.code).await;
        self.pause().await;
        self.ctx.bomb.defocus(&self.code).await;
        self.pause().await;
    }

    /// Focuses the module and drives the remaining steps until the handler
    /// is exhausted, the module is solved, a strike lands or a directive
    /// stops the run.
    pub(crate) async fn run(&self, identity: &Identity, mut steps: StepStream) -> DispatchOutcome {
        self.ctx.bomb.focus(&self.code).await;
        self.pause().await;
        let previous = self.strike_count();

        while self.keep_running(previous) {
            let directive = match steps.next().await {
                None => break,
                Some(Err(fault)) => {
                    self.handle_fault(fault).await;
                    break;
                }
                Some(Ok(directive)) => directive,
            };
            self.with_session(|session| session.responded = true);
            let flow = self.interpret(identity, directive).await;
            self.process_events();
            if flow == Flow::Stop {
                break;
            }
        }
        drop(steps);

        self.wind_down(identity, previous).await
    }

    fn keep_running(&self, previous: u32) -> bool {
        let state = lock(&self.state);
        let batching = state
            .session
            .as_ref()
            .is_some_and(|session| session.multiple_strikes);
        (state.strike_count == previous || batching) && !self.module.is_solved()
    }

    async fn interpret(&self, identity: &Identity, directive: Directive) -> Flow {
        match directive {
            Directive::Suspend(step) => {
                self.ctx.scheduler.suspend(step).await;
                return Flow::Continue;
            }
            Directive::Strike => {
                self.with_session(|session| session.delegated_striker = Some(identity.clone()));
            }
            Directive::Solve => {
                self.with_session(|session| session.delegated_solver = Some(identity.clone()));
            }
            Directive::UnsubmittablePenalty => self.penalise_unsubmittable(identity),
            Directive::StrikeMessage(message) => {
                self.with_session(|session| session.strike_message = Some(message));
            }
            Directive::ParseError => {
                self.with_session(|session| session.parse_error = true);
                return Flow::Stop;
            }
            Directive::TryCancel => {
                if self.canceller.should_cancel() {
                    debug!(module = %self.code, "command cancelled");
                    self.canceller.reset();
                    self.handler.set_cancel_requested(false);
                    return Flow::Stop;
                }
            }
            Directive::SendToChat(text) => self.ctx.chat.send_message(&text),
            Directive::SendToChatError(text) => self.ctx.chat.command_error(identity, &text),
            Directive::AddStrike => self.on_strike(),
            Directive::MultipleStrikes => {
                self.with_session(|session| session.multiple_strikes = true);
            }
            Directive::AutoSolve(reason) => {
                self.handle_fault(HandlerFault::AutoSolve(reason)).await;
                return Flow::Stop;
            }
            Directive::Detonate(args) => {
                self.detonate(identity, args);
                return Flow::Stop;
            }
            Directive::AmbientMusic => {
                let first = self
                    .with_session(|session| !mem::replace(&mut session.music_started, true))
                    .unwrap_or(false);
                if first {
                    self.ctx.music.start_random();
                }
            }
            Directive::HideCamera => {
                let first = self
                    .with_session(|session| !mem::replace(&mut session.camera_hidden, true))
                    .unwrap_or(false);
                if first {
                    self.ctx.with_cameras(|cameras| {
                        cameras.hide();
                        cameras.hide_hud();
                    });
                    self.ctx.bomb.hide_main_ui().await;
                }
            }
            Directive::Rotate(rotation) => {
                self.with_session(|session| session.rotated = true);
                self.ctx.bomb.rotate_by_local(rotation);
                if CAMERA_FOLLOWS_ROTATION.contains(&self.module.module_type()) {
                    self.ctx.bomb.rotate_camera_by_local(&self.code, rotation);
                }
            }
            Directive::RotateWithCamera { module, camera } => {
                self.with_session(|session| session.rotated = true);
                self.ctx.bomb.rotate_by_local(module);
                self.ctx.bomb.rotate_camera_by_local(&self.code, camera);
            }
            Directive::Interact(selectable) => {
                if let Err(fault) = self.module.interact(&selectable) {
                    self.handle_fault(fault).await;
                    return Flow::Stop;
                }
            }
        }

        self.ctx.scheduler.suspend(Suspend::Frame).await;
        Flow::Continue
    }

    fn detonate(&self, identity: &Identity, args: DetonateArgs) {
        let bomb = &self.ctx.bomb;
        let remaining = bomb.strike_limit().saturating_sub(bomb.strike_count());
        self.award_strikes(identity, remaining);
        let module_name = args
            .module_name
            .unwrap_or_else(|| self.module.display_name().to_owned());
        bomb.cause_explosion(args.message.as_deref().unwrap_or_default(), &module_name);
    }

    async fn wind_down(&self, identity: &Identity, previous: u32) -> DispatchOutcome {
        let Some(session) = lock(&self.state).session.clone() else {
            return DispatchOutcome::Completed { responded: false };
        };

        if !session.responded && !session.faulted {
            self.ctx.chat.command_invalid(identity);
        }
        if session.rotated {
            self.ctx.bomb.rotate_by_local(Rotation::IDENTITY);
            self.ctx
                .bomb
                .rotate_camera_by_local(&self.code, Rotation::IDENTITY);
        }
        if session.camera_hidden {
            self.ctx.with_cameras(|cameras| {
                cameras.show();
                cameras.show_hud();
            });
            self.ctx.bomb.show_main_ui().await;
        }
        if session.music_started {
            self.ctx.music.stop();
        }
        if session.multiple_strikes {
            self.with_session(|session| session.multiple_strikes = false);
            let batch = self.strike_count().saturating_sub(previous);
            if batch > 0 {
                self.award_strikes(identity, batch);
                self.ctx.with_cameras(|cameras| cameras.update_strikes(true));
            }
        }

        if !session.parse_error {
            self.pause().await;
        }
        self.ctx.bomb.defocus(&self.code).await;
        self.pause().await;

        DispatchOutcome::Completed {
            responded: session.responded,
        }
    }
}
