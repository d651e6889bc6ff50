use serde::{Deserialize, Serialize};

use crate::client::{Flatpak, FLATPAK_BIN};
use crate::error::FlatpakError;
use crate::subprocess::ProcessCommandBuilder;
use crate::types::{parse_info_output, PackageInfo, Ref};

/// Flags for `flatpak info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoOptions {
    pub user: bool,
    pub system: bool,
}

impl InfoOptions {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.user {
            args.push("--user".to_string());
        }
        if self.system {
            args.push("--system".to_string());
        }
        args
    }
}

impl Flatpak {
    /// Details of one installed package, from `flatpak info <ref>`.
    pub async fn info(
        &self,
        reference: &Ref,
        opts: &InfoOptions,
    ) -> Result<PackageInfo, FlatpakError> {
        let output = self
            .run_checked(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .arg("info")
                    .arg(&reference.to_string())
                    .args(opts.args())
                    .build(),
            )
            .await?;

        Ok(parse_info_output(&output.stdout))
    }
}
