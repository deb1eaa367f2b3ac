//! Building a single fork end to end.

use std::path::Path;
use std::process::Command;

use cookbook_core::error::BuildError;
use cookbook_core::pipeline::build_game_data;
use cookbook_data::{DataLoadError, ForkInfo, ForkList, read_sorting_id_rewrites};
use cookbook_export::{ExportError, ProcessedFork, now_millis, save_forks};
use cookbook_sprites::{SpriteError, build_sprite_sheet};
use tracing::{info, warn};

/// Commit recorded when the fork's checkout has no readable git history.
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Anything that stops a build. Every variant aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error("fork {fork}: {source}")]
    Build {
        fork: String,
        #[source]
        source: BuildError,
    },

    #[error(transparent)]
    Sprites(#[from] SpriteError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// The `HEAD` commit of the checkout at `path`, or [`UNKNOWN_COMMIT`].
pub fn git_commit_hash(path: &Path) -> String {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).current_dir(path).output();
    match output {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        Ok(output) => {
            warn!(
                "Could not read commit hash of {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            UNKNOWN_COMMIT.to_string()
        }
        Err(e) => {
            warn!("Could not run git in {}: {e}", path.display());
            UNKNOWN_COMMIT.to_string()
        }
    }
}

/// Load, filter, resolve and draw one fork.
pub fn build_fork(id: &str, fork: &ForkInfo) -> Result<ProcessedFork, CliError> {
    info!("Starting work on fork {id}: {}...", fork.name);

    let commit = git_commit_hash(&fork.path);
    info!("Generating data from commit: {commit}");

    let loaded = fork.load()?;
    let data = build_game_data(&loaded.raw, &loaded.locale, &fork.filter_config(), &fork.settings()).map_err(
        |source| CliError::Build {
            fork: id.to_string(),
            source,
        },
    )?;
    info!(
        "Resolved {} entities, {} reagents and {} recipes",
        data.entities.len(),
        data.reagents.len(),
        data.recipes.len()
    );
    info!("Resolved {} special diets and reagents", data.special_traits.len());

    let sorting_id_rewrites = read_sorting_id_rewrites(&fork.sorting_id_rewrites, &data.entities)?;

    let sprites = build_sprite_sheet(&data, &fork.textures_dir(), &fork.mix_fill_state)?;
    info!("Built sprite sheet for {} sprites", sprites.points.len());

    info!("Finished building {id}");
    Ok(ProcessedFork {
        id: id.to_string(),
        name: fork.name.clone(),
        description: fork.description.clone(),
        default: fork.default,
        hidden: fork.hidden,
        repo: fork.repo.clone(),
        commit,
        data,
        sprites,
        microwave_recipe_types: fork.microwave_recipe_types.clone(),
        sorting_id_rewrites,
    })
}

/// Build every fork in order, then write all output.
///
/// Nothing is written unless every fork builds.
pub fn build_all(forks: &ForkList, out_dir: &Path) -> Result<(), CliError> {
    let mut processed = Vec::with_capacity(forks.len());
    for (id, fork) in forks.iter() {
        processed.push(build_fork(id, fork)?);
    }

    info!("Finished building everything. Writing data...");
    save_forks(out_dir, &processed, now_millis())?;
    info!("Done.");
    Ok(())
}
