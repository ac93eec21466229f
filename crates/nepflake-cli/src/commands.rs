use std::{io::Write, thread, time::Duration, time::Instant};

use anyhow::bail;
use nepflake::{Error, NeptuneId, SnowflakeGenerator, SnowflakeId, TimeSource};
use tracing::{info, warn};

use crate::config::{GenerateConfig, OutputFormat};

/// Issues `config.count` IDs and writes them to `out`, sorted, one per line.
///
/// With more than one thread, all threads share `generator`, so the output
/// doubles as a live check that concurrent callers never collide.
pub fn generate<T>(
    generator: &SnowflakeGenerator<NeptuneId, T>,
    config: &GenerateConfig,
    out: &mut impl Write,
) -> anyhow::Result<()>
where
    T: TimeSource + Sync,
{
    let start = Instant::now();

    let mut ids = if config.threads == 1 {
        issue(generator, config.count, config.max_clock_retries)?
    } else {
        let per_thread = config.count / config.threads;
        let remainder = config.count % config.threads;

        thread::scope(|s| {
            let handles: Vec<_> = (0..config.threads)
                .map(|i| {
                    let count = per_thread + usize::from(i < remainder);
                    s.spawn(move || issue(generator, count, config.max_clock_retries))
                })
                .collect();

            let mut ids = Vec::with_capacity(config.count);
            for handle in handles {
                match handle.join() {
                    Ok(batch) => ids.extend(batch?),
                    Err(_) => bail!("ID worker thread panicked"),
                }
            }
            Ok::<_, anyhow::Error>(ids)
        })?
    };

    let elapsed = start.elapsed();
    ids.sort_unstable();

    for id in &ids {
        match config.format {
            OutputFormat::Decimal => writeln!(out, "{id}")?,
            OutputFormat::Padded => writeln!(out, "{}", id.to_padded_string())?,
            OutputFormat::Debug => writeln!(out, "{id:?}")?,
        }
    }

    info!(
        count = ids.len(),
        threads = config.threads,
        node_id = generator.node_id(),
        data_center_id = generator.data_center_id(),
        ?elapsed,
        "issued IDs"
    );
    Ok(())
}

fn issue<T>(
    generator: &SnowflakeGenerator<NeptuneId, T>,
    count: usize,
    max_clock_retries: u32,
) -> anyhow::Result<Vec<NeptuneId>>
where
    T: TimeSource,
{
    (0..count)
        .map(|_| generate_with_retry(generator, max_clock_retries))
        .collect()
}

/// Retries a clock regression up to `max_retries` times, sleeping for the
/// amount the clock fell behind. Any other error is returned immediately.
fn generate_with_retry<T>(
    generator: &SnowflakeGenerator<NeptuneId, T>,
    max_retries: u32,
) -> anyhow::Result<NeptuneId>
where
    T: TimeSource,
{
    let mut attempt = 0;
    loop {
        match generator.generate_with(|_| thread::yield_now()) {
            Ok(id) => return Ok(id),
            Err(Error::ClockMovedBackward {
                last_timestamp,
                now,
            }) if attempt < max_retries => {
                attempt += 1;
                let behind_ms = (last_timestamp - now).max(1);
                warn!(attempt, max_retries, behind_ms, "clock moved backward, retrying");
                thread::sleep(Duration::from_millis(behind_ms.unsigned_abs()));
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Writes the decoded fields of each ID to `out`.
///
/// `epoch_millis` converts the relative timestamp back to UNIX milliseconds;
/// it must match the epoch the IDs were issued with.
pub fn inspect(ids: &[i64], epoch_millis: i64, out: &mut impl Write) -> anyhow::Result<()> {
    for &raw in ids {
        if raw < 0 {
            bail!("{raw} is not a valid ID: the sign bit is always clear");
        }

        let id = NeptuneId::from_raw(raw);
        writeln!(
            out,
            "{raw}\ttimestamp={} unix_ms={} data_center_id={} node_id={} sequence={}",
            id.timestamp(),
            id.timestamp() + epoch_millis,
            id.data_center_id(),
            id.node_id(),
            id.sequence(),
        )?;
    }
    Ok(())
}
