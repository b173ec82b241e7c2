//! Replace special symbols in a translated question file

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::sanitize::sanitise_question_map;
use anyhow::Result;
use tracing::info;

/// Clean every question of the `load_name` file and save the result as
/// `save_name`: underscores become spaces, braces are dropped, and HTML
/// character references are decoded.
///
/// # Errors
///
/// Fails when the input file is missing or the output cannot be written.
pub fn run(config: &Config, load_name: &str, save_name: &str) -> Result<()> {
    let store = DatasetStore::new(&config.dataset.root)?;
    let questions = store.load_question_map(load_name)?;
    let cleaned = sanitise_question_map(&questions);
    let path = store.save_question_map(save_name, &cleaned)?;
    info!(
        questions = cleaned.len(),
        path = %path.display(),
        "special symbols replaced"
    );
    Ok(())
}
