use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::*;

/// Progress of a fingerprinting run, counted in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// Fingerprint every frame of every asset, with at most cfg.max_in_flight() frames being
/// processed at once.
///
/// An asset is only returned once all of its frames have been fingerprinted. If any frame of an
/// asset fails (or the asset has no frames at all) the asset is left out of the returned map and
/// reported as a [SkippedAsset] instead. Other assets are unaffected.
///
/// on_progress is called once per finished frame, on the calling thread, with `processed`
/// strictly increasing. It is never called from inside the worker pool.
pub fn fingerprint_assets<F>(
    assets: &[AssetFrames],
    cfg: &PipelineCfg,
    mut on_progress: F,
) -> Result<(BTreeMap<String, Vec<Fingerprint>>, Vec<SkippedAsset>), PipelineErrorKind>
where
    F: FnMut(Progress),
{
    let max_in_flight = cfg.max_in_flight();
    if max_in_flight == 0 {
        return Err(CfgErrorKind::MaxInFlight.into());
    }

    //never more workers than cores
    let num_threads = max_in_flight.min(rayon::current_num_threads());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|idx| format!("fingerprint-{}", idx))
        .build()
        .map_err(|e| PipelineErrorKind::WorkerPool(e.to_string()))?;

    let total = assets.iter().map(AssetFrames::len).sum();
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<()>();

    let per_asset = std::thread::scope(|scope| {
        let worker = scope.spawn(move || {
            pool.install(|| {
                assets
                    .par_iter()
                    .map(|asset| {
                        asset
                            .frames()
                            .par_iter()
                            .map(|frame| {
                                let fingerprint = fingerprint_path(frame);
                                //the receiver outlives the pool, so this cannot fail
                                let _ = done_tx.send(());
                                fingerprint
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
            //done_tx is dropped here, which ends the loop below
        });

        for (idx, ()) in done_rx.iter().enumerate() {
            on_progress(Progress {
                processed: idx + 1,
                total,
            });
        }

        worker.join()
    });

    let per_asset = match per_asset {
        Ok(per_asset) => per_asset,
        Err(panic) => std::panic::resume_unwind(panic),
    };

    let mut fingerprints = BTreeMap::new();
    let mut skipped = vec![];
    for (asset, frame_results) in assets.iter().zip(per_asset) {
        let asset_id = asset.asset_id().to_string();

        if frame_results.is_empty() {
            warn!(target: "pipeline", "Skipping {}: no frames", asset_id);
            skipped.push(SkippedAsset::new(asset_id, SkipReason::EmptySet));
            continue;
        }

        //the first failing frame in sequence order is the one reported
        match frame_results.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(asset_fingerprints) => {
                debug!(
                    target: "pipeline",
                    "{}: {} fingerprint(s)",
                    asset_id,
                    asset_fingerprints.len()
                );
                fingerprints.insert(asset_id, asset_fingerprints);
            }
            Err(e) => {
                warn!(target: "pipeline", "Skipping {}: {}", asset_id, e);
                skipped.push(SkippedAsset::new(asset_id, SkipReason::Decode(e)));
            }
        }
    }

    Ok((fingerprints, skipped))
}
