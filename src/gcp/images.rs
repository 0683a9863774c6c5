//! Public image lookup
//!
//! Maps short OS names (`debian`, `ubuntu`, `centos`, ...) to public image
//! family URLs, so a launch can name an OS instead of a full image.

use crate::error::{ActionError, Result};

/// OS name, image project, default family
const PUBLIC_IMAGES: &[(&str, &str, &str)] = &[
    ("debian", "debian-cloud", "debian-12"),
    ("ubuntu", "ubuntu-os-cloud", "ubuntu-2204-lts"),
    ("centos", "centos-cloud", "centos-stream-9"),
    ("rhel", "rhel-cloud", "rhel-9"),
    ("rocky", "rocky-linux-cloud", "rocky-linux-9"),
    ("cos", "cos-cloud", "cos-stable"),
    ("windows", "windows-cloud", "windows-2022"),
];

fn family_url(project: &str, family: &str) -> String {
    format!("projects/{}/global/images/family/{}", project, family)
}

/// Resolve an OS name to a source image URL.
///
/// Accepted forms:
/// - a full or partial image URL (`https://...`, `projects/...`), used as is
/// - `project/family`
/// - a bare OS name (`ubuntu`) or a family starting with one (`ubuntu-2004-lts`)
pub fn resolve_os_image(os: &str) -> Result<String> {
    let os = os.trim();

    if os.starts_with("https://") || os.starts_with("projects/") {
        return Ok(os.to_string());
    }

    if let Some((project, family)) = os.split_once('/') {
        if project.is_empty() || family.is_empty() || family.contains('/') {
            return Err(ActionError::UnknownImage(os.to_string()));
        }
        return Ok(family_url(project, family));
    }

    let lower = os.to_lowercase();
    for (name, project, family) in PUBLIC_IMAGES {
        if lower == *name {
            return Ok(family_url(project, family));
        }
        if lower.starts_with(&format!("{}-", name)) {
            return Ok(family_url(project, &lower));
        }
    }

    Err(ActionError::UnknownImage(os.to_string()))
}
