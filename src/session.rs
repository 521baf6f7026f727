//! Session-oriented frame sequencing.
//!
//! A [`ParallaxSession`] front-loads input validation and depth normalization, then
//! produces frames sequentially or across a rayon pool, always delivering them to the
//! sink in strictly increasing frame-index order.

use std::collections::HashMap;
use std::sync::mpsc;

use rayon::prelude::*;

use crate::depth::{DepthMap, normalize_depth};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::field::DisplacementField;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::frame::FrameRgb;
use crate::foundation::grid::ScalarGrid;
use crate::motion::{MotionParams, shifts_for_frame};
use crate::warp::resample;

/// Cap on frames held by the reorder buffer, chunk size permitting.
const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

/// Options controlling [`ParallaxSession::generate`].
#[derive(Clone, Debug)]
pub struct SessionOpts {
    /// Enable frame-level parallelism (rayon), using a dedicated thread pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Chunk size bounding the out-of-order window in parallel mode.
    pub chunk_size: usize,
    /// Bounded channel capacity between frame producers and the sink thread.
    pub channel_capacity: usize,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 64,
            channel_capacity: 4,
        }
    }
}

/// Statistics for one completed `generate` run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Total frames produced and delivered to the sink.
    pub frames_total: u64,
}

/// One photo + depth estimate + motion configuration, ready to produce frames.
///
/// Frame N depends only on its index and the fixed per-run inputs, never on prior
/// frames, so frames are independently computable; `generate` exploits that in parallel
/// mode and restores timeline order at the sink boundary.
#[derive(Debug)]
pub struct ParallaxSession {
    image: FrameRgb,
    depth_inverted: DepthMap,
    params: MotionParams,
    opts: SessionOpts,
}

impl ParallaxSession {
    /// Validate inputs and prepare a session.
    ///
    /// The raw depth grid is normalized to `[0, 1]` and inverted once (closer moves
    /// more); degenerate depth aborts here, before any frame work begins.
    pub fn new(
        image: FrameRgb,
        raw_depth: &ScalarGrid,
        params: MotionParams,
        opts: SessionOpts,
    ) -> DriftResult<Self> {
        if image.width == 0 || image.height == 0 {
            return Err(DriftError::input("source image must have non-zero area"));
        }
        if raw_depth.width() != image.width || raw_depth.height() != image.height {
            return Err(DriftError::input(format!(
                "depth grid {}x{} does not match image {}x{}",
                raw_depth.width(),
                raw_depth.height(),
                image.width,
                image.height
            )));
        }
        params.validate()?;

        let depth_inverted = normalize_depth(raw_depth)?.inverted();
        Ok(Self {
            image,
            depth_inverted,
            params,
            opts,
        })
    }

    /// Source image dimensions (output frames always match).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }

    /// Total frame count for the configured duration and rate.
    pub fn total_frames(&self) -> u64 {
        self.params.total_frames()
    }

    /// Render a single frame into a fresh buffer.
    pub fn render_frame(&self, frame: FrameIndex) -> DriftResult<FrameRgb> {
        let total = self.total_frames();
        if frame.0 >= total {
            return Err(DriftError::validation(format!(
                "frame index {} out of range (total {total})",
                frame.0
            )));
        }
        let mut field = DisplacementField::new(self.image.width, self.image.height);
        self.render_with(frame.0, total, &mut field)
    }

    fn render_with(
        &self,
        frame: u64,
        total: u64,
        field: &mut DisplacementField,
    ) -> DriftResult<FrameRgb> {
        let (shift_x, shift_y) = shifts_for_frame(frame, total, self.params.max_shift_px);
        field.rebuild(&self.depth_inverted, shift_x as f32, shift_y as f32)?;
        resample(&self.image, field)
    }

    /// Produce every frame of the clip and stream it into `sink` in timeline order.
    ///
    /// The sink runs on a scoped thread and receives frames over a bounded channel
    /// (backpressure against an encoder that cannot keep up). In parallel mode frames
    /// complete out of order; a pending map keyed by frame index restores order before
    /// delivery. The first producer or sink error aborts the run.
    #[tracing::instrument(skip(self, sink), fields(total = self.total_frames()))]
    pub fn generate(&self, sink: &mut dyn FrameSink) -> DriftResult<SessionStats> {
        let total = self.total_frames();
        let cfg = SinkConfig {
            width: self.image.width,
            height: self.image.height,
            fps: self.params.fps,
        };

        let cap = self.opts.channel_capacity.max(1);
        let bytes_per_frame = (cfg.width as u64)
            .saturating_mul(cfg.height as u64)
            .saturating_mul(3)
            .max(1);
        let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);
        let chunk_size = (self.opts.chunk_size.max(1) as u64)
            .min(max_chunk_by_mem)
            .min(total);

        let pool = if self.opts.parallel {
            Some(build_thread_pool(self.opts.threads)?)
        } else {
            None
        };

        tracing::debug!(total, parallel = self.opts.parallel, "generating frames");

        // Sink thread: enforce in-order delivery regardless of render completion order.
        std::thread::scope(|scope| -> DriftResult<SessionStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
            let sink_ref: &mut dyn FrameSink = sink;

            let enc = scope.spawn(move || -> DriftResult<()> {
                sink_ref.begin(cfg)?;

                let mut next = 0u64;
                let mut pending = HashMap::<u64, FrameRgb>::new();
                while next < total {
                    if let Some(frame) = pending.remove(&next) {
                        sink_ref.push_frame(FrameIndex(next), &frame)?;
                        next += 1;
                        continue;
                    }

                    let msg = rx.recv().map_err(|_| {
                        DriftError::sink("sink channel disconnected unexpectedly")
                    })?;
                    pending.insert(msg.idx, msg.frame);
                }

                sink_ref.end()?;
                Ok(())
            });

            let produce_res = if let Some(pool) = pool.as_ref() {
                self.produce_parallel(pool, &tx, total, chunk_size)
            } else {
                self.produce_sequential(&tx, total)
            };

            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| DriftError::sink("sink thread panicked"))?;

            // Producer failures usually surface on both sides (the sink channel
            // disconnects); report the producer error first.
            produce_res?;
            enc_res?;
            Ok(SessionStats {
                frames_total: total,
            })
        })
    }

    fn produce_sequential(&self, tx: &mpsc::SyncSender<FrameMsg>, total: u64) -> DriftResult<()> {
        let mut field = DisplacementField::new(self.image.width, self.image.height);
        for f in 0..total {
            let frame = self.render_with(f, total, &mut field)?;
            tx.send(FrameMsg { idx: f, frame })
                .map_err(|_| DriftError::sink("sink thread is not accepting frames"))?;
        }
        Ok(())
    }

    fn produce_parallel(
        &self,
        pool: &rayon::ThreadPool,
        tx: &mpsc::SyncSender<FrameMsg>,
        total: u64,
        chunk_size: u64,
    ) -> DriftResult<()> {
        let mut chunk_start = 0u64;
        while chunk_start < total {
            let chunk_end = (chunk_start + chunk_size).min(total);
            pool.install(|| {
                (chunk_start..chunk_end).into_par_iter().try_for_each_init(
                    || {
                        (
                            DisplacementField::new(self.image.width, self.image.height),
                            tx.clone(),
                        )
                    },
                    |(field, tx), f| -> DriftResult<()> {
                        let frame = self.render_with(f, total, field)?;
                        tx.send(FrameMsg { idx: f, frame }).map_err(|_| {
                            DriftError::sink("sink thread is not accepting frames")
                        })?;
                        Ok(())
                    },
                )
            })?;
            chunk_start = chunk_end;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct FrameMsg {
    idx: u64,
    frame: FrameRgb,
}

fn build_thread_pool(threads: Option<usize>) -> DriftResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(DriftError::validation(
            "session 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| DriftError::validation(format!("failed to build rayon thread pool: {e}")))
}
