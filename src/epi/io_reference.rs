// Reading the census reference table.

use crate::epi::*;

pub fn read_reference(path: &str) -> EpiResult<ReferenceDirectory> {
    info!("Attempting to read reference data {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let directory = ReferenceDirectory::load(&contents).context(LoadingDataSnafu { path })?;
    debug!(
        "read_reference: {} counties in {} states",
        directory.len(),
        directory.states().len()
    );
    Ok(directory)
}
