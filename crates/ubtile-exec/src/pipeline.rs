//! Ping-pong tile pipeline
//!
//! One worker's loop over its tiles, split into a copy-in stage and a
//! compute/copy-out stage that run concurrently. Two tile buffers alternate
//! between the stages: while the kernel works on one, the next tile is
//! staged into the other. A pair of bounded channels carries the buffers,
//! `ready` from copy-in to compute and `free` back again, so at most two
//! tiles are in flight and the copy-in stage waits whenever both are busy.
//!
//! # Example
//!
//! ```
//! use ubtile_exec::PingPongPipeline;
//!
//! let input: Vec<f32> = (0..10).map(|i| i as f32).collect();
//! let mut output = vec![0.0f32; 10];
//!
//! let mut pipeline = PingPongPipeline::new(4);
//! let stats = pipeline
//!     .run(&input, &mut output, &[0..4, 4..8, 8..10], &|src: &[f32], dst: &mut [f32]| {
//!         for (d, s) in dst.iter_mut().zip(src) {
//!             *d = s * 2.0;
//!         }
//!     })
//!     .unwrap();
//!
//! assert_eq!(stats.tiles, 3);
//! assert_eq!(output[9], 18.0);
//! ```

use anyhow::{anyhow, bail, Result};
use std::ops::Range;
use std::sync::mpsc::sync_channel;
use std::thread;

/// Tile buffers per pipeline
pub const BUFFER_COUNT: usize = 2;

/// Counters of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub tiles: usize,
    pub elements: usize,
}

impl std::ops::Add for PipelineStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            tiles: self.tiles + rhs.tiles,
            elements: self.elements + rhs.elements,
        }
    }
}

/// Double-buffered copy-in / compute pipeline over fixed-capacity tiles
#[derive(Debug)]
pub struct PingPongPipeline<T> {
    tile_capacity: usize,
    buffers: Vec<Vec<T>>,
}

impl<T> PingPongPipeline<T>
where
    T: Copy + Send + Sync,
{
    /// Create a pipeline whose buffers hold `tile_capacity` elements each
    pub fn new(tile_capacity: usize) -> Self {
        Self {
            tile_capacity,
            buffers: (0..BUFFER_COUNT)
                .map(|_| Vec::with_capacity(tile_capacity))
                .collect(),
        }
    }

    pub fn tile_capacity(&self) -> usize {
        self.tile_capacity
    }

    /// Stream `tiles` of `input` through the kernel into the same ranges of
    /// `output`.
    ///
    /// The kernel receives the staged input tile and the destination slice,
    /// both of the tile's length. Tiles are processed in order.
    ///
    /// # Errors
    ///
    /// Fails if `input` and `output` differ in length, a tile exceeds the
    /// buffer capacity or the slices, or the copy-in stage panics.
    pub fn run<K>(
        &mut self,
        input: &[T],
        output: &mut [T],
        tiles: &[Range<usize>],
        kernel: &K,
    ) -> Result<PipelineStats>
    where
        K: Fn(&[T], &mut [T]) + Sync,
    {
        if input.len() != output.len() {
            bail!(
                "input has {} elements but output has {}",
                input.len(),
                output.len()
            );
        }
        for range in tiles {
            if range.start > range.end || range.end > input.len() {
                bail!("tile {:?} out of bounds for {} elements", range, input.len());
            }
            if range.len() > self.tile_capacity {
                bail!(
                    "tile {:?} exceeds buffer capacity {}",
                    range,
                    self.tile_capacity
                );
            }
        }

        while self.buffers.len() < BUFFER_COUNT {
            self.buffers.push(Vec::with_capacity(self.tile_capacity));
        }

        let (ready_tx, ready_rx) = sync_channel::<(Range<usize>, Vec<T>)>(BUFFER_COUNT);
        let (free_tx, free_rx) = sync_channel::<Vec<T>>(BUFFER_COUNT);
        for buffer in self.buffers.drain(..) {
            free_tx
                .send(buffer)
                .map_err(|_| anyhow!("free buffer channel closed"))?;
        }

        let mut stats = PipelineStats::default();

        let free_rx = thread::scope(|scope| {
            let copy_in = scope.spawn(move || {
                for range in tiles {
                    let Ok(mut buffer) = free_rx.recv() else {
                        break;
                    };
                    buffer.clear();
                    buffer.extend_from_slice(&input[range.clone()]);
                    if ready_tx.send((range.clone(), buffer)).is_err() {
                        break;
                    }
                }
                free_rx
            });

            for (range, buffer) in ready_rx.iter() {
                kernel(&buffer, &mut output[range.clone()]);
                stats.tiles += 1;
                stats.elements += range.len();
                if free_tx.send(buffer).is_err() {
                    break;
                }
            }
            drop(free_tx);

            copy_in
                .join()
                .map_err(|_| anyhow!("copy-in stage panicked"))
        })?;

        if stats.tiles != tiles.len() {
            bail!(
                "pipeline stopped after {} of {} tiles",
                stats.tiles,
                tiles.len()
            );
        }
        self.buffers = free_rx.try_iter().collect();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_one(src: &[i32], dst: &mut [i32]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = s + 1;
        }
    }

    #[test]
    fn test_every_tile_processed_in_order() {
        let input: Vec<i32> = (0..25).collect();
        let mut output = vec![0; 25];
        let tiles = [0..8, 8..16, 16..24, 24..25];

        let stats = PingPongPipeline::new(8)
            .run(&input, &mut output, &tiles, &add_one)
            .unwrap();

        assert_eq!(stats, PipelineStats { tiles: 4, elements: 25 });
        let expected: Vec<i32> = (1..26).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_buffers_reused_across_runs() {
        let input = vec![1; 16];
        let mut output = vec![0; 16];
        let mut pipeline = PingPongPipeline::new(4);

        for _ in 0..3 {
            pipeline
                .run(&input, &mut output, &[0..4, 4..8, 8..12, 12..16], &add_one)
                .unwrap();
            assert_eq!(pipeline.buffers.len(), BUFFER_COUNT);
        }
        assert!(output.iter().all(|&v| v == 2));
    }

    #[test]
    fn test_many_tiles_through_two_buffers() {
        let input: Vec<i32> = (0..301).collect();
        let mut output = vec![0; 301];
        let tiles: Vec<Range<usize>> = (0..301).step_by(3).map(|s| s..(s + 3).min(301)).collect();
        let mut pipeline = PingPongPipeline::new(3);

        let stats = pipeline.run(&input, &mut output, &tiles, &add_one).unwrap();

        assert_eq!(stats.tiles, tiles.len());
        assert_eq!(stats.elements, 301);
        assert_eq!(pipeline.buffers.len(), BUFFER_COUNT);
        assert!(output.iter().zip(&input).all(|(o, i)| *o == i + 1));
    }

    #[test]
    fn test_no_tiles() {
        let stats = PingPongPipeline::<i32>::new(4)
            .run(&[], &mut [], &[], &add_one)
            .unwrap();
        assert_eq!(stats, PipelineStats::default());
    }

    #[test]
    fn test_rejects_oversized_tile() {
        let input = vec![0; 10];
        let mut output = vec![0; 10];
        let result = PingPongPipeline::new(4).run(&input, &mut output, &[0..10], &add_one);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_out_of_bounds_tile() {
        let input = vec![0; 10];
        let mut output = vec![0; 10];
        let result = PingPongPipeline::new(8).run(&input, &mut output, &[6..12], &add_one);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let input = vec![0; 10];
        let mut output = vec![0; 9];
        let result = PingPongPipeline::new(8).run(&input, &mut output, &[0..8], &add_one);
        assert!(result.is_err());
    }
}
