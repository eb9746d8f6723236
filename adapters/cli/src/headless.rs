//! Text backend that simulates frames at a fixed cadence and prints them.

use std::{io::Write, iter::Peekable, time::Duration, vec::IntoIter};

use anyhow::{Context, Result};
use diamond_heist_rendering::{FrameInput, Presentation, RenderingBackend, Scene};

use crate::{config::FRAMES_PER_SECOND, replay_code::ScriptedInput};

/// Simulated time between two frames.
pub(crate) const FRAME_DELTA: Duration =
    Duration::from_nanos(1_000_000_000 / FRAMES_PER_SECOND);

/// Rendering backend that needs no window or terminal control.
///
/// Scripted inputs are delivered on the frame they were recorded for. A frame
/// is printed every `render_every` frames and whenever it carries feedback.
#[derive(Debug)]
pub(crate) struct HeadlessBackend<W> {
    out: W,
    frames: u64,
    render_every: u64,
    script: Peekable<IntoIter<ScriptedInput>>,
}

impl<W> HeadlessBackend<W>
where
    W: Write,
{
    pub(crate) fn new(out: W, frames: u64, render_every: u64, script: Vec<ScriptedInput>) -> Self {
        Self {
            out,
            frames,
            render_every: render_every.max(1),
            script: script.into_iter().peekable(),
        }
    }

    fn input_for(&mut self, frame: u64) -> FrameInput {
        let mut input = FrameInput::default();
        while let Some(scripted) = self.script.next_if(|scripted| scripted.frame <= frame) {
            scripted.action.apply_to(&mut input);
        }
        input
    }
}

impl<W> RenderingBackend for HeadlessBackend<W>
where
    W: Write,
{
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        writeln!(self.out, "{}", presentation.title).context("failed to write title")?;
        let mut scene = presentation.scene;

        for frame in 0..self.frames {
            let input = self.input_for(frame);
            update_scene(FRAME_DELTA, input, &mut scene);
            scene
                .validate()
                .with_context(|| format!("invalid scene on frame {frame}"))?;

            if frame % self.render_every == 0 || !scene.feedback.is_empty() {
                writeln!(self.out, "{}\n", scene.compose())
                    .with_context(|| format!("failed to write frame {frame}"))?;
            }
        }

        if self.script.peek().is_some() {
            log::warn!("replay script extends past the last simulated frame");
        }
        self.out.flush().context("failed to flush output")
    }
}
