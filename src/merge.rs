//! Profile update merge
//!
//! `PATCH /users/{email}` can carry, all at once: scalar fields, a new
//! education or experience entry, an index to remove from either list,
//! full replacement lists, a new profile image and per-entry education
//! logos. This module turns that payload into the final field values.
//!
//! The work is split in three steps so that nothing is uploaded for a
//! payload that cannot be applied:
//!
//! 1. `ProfileUpdate::from_form` parses every JSON payload up front.
//! 2. `upload_all` sends each file to the media host concurrently and joins
//!    the URLs back by `UploadTarget`, never by completion order.
//! 3. `ProfileUpdate::apply` computes and writes the new fields onto the
//!    stored profile (inside the store's write transaction).

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::AppError;
use crate::form::FormData;
use crate::model::{Education, Experience, IndexInput, Profile};
use crate::uploader::{MediaUploader, UploadError, UploadOptions, UploadedFile};

/// Scalar profile fields accepted by the update route
const SCALAR_FIELDS: [&str; 10] = [
    "name",
    "bio",
    "gender",
    "dob",
    "profession",
    "phone",
    "linkedin",
    "facebook",
    "youtube",
    "address",
];

/// A parsed `PATCH /users/{email}` payload
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    /// Scalar fields present in the request, by name
    pub fields: BTreeMap<&'static str, String>,
    pub new_education: Option<Education>,
    pub remove_education_index: Option<IndexInput>,
    pub new_experience: Option<Experience>,
    pub remove_experience_index: Option<IndexInput>,
    /// Full replacement list; wins over append/remove
    pub education: Option<Vec<Education>>,
    /// Full replacement list; wins over append/remove
    pub experience: Option<Vec<Experience>>,
    pub image: Option<UploadedFile>,
    /// Logo files keyed by the education index they belong to
    pub education_logos: BTreeMap<usize, UploadedFile>,
}

/// Where an uploaded file's URL ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    ProfileImage,
    EducationLogo(usize),
}

/// URLs returned by the media host, keyed by their target
#[derive(Debug, Default, PartialEq)]
pub struct ResolvedUploads {
    pub image: Option<String>,
    pub logos: BTreeMap<usize, String>,
}

impl FromIterator<(UploadTarget, String)> for ResolvedUploads {
    fn from_iter<I: IntoIterator<Item = (UploadTarget, String)>>(iter: I) -> Self {
        let mut resolved = ResolvedUploads::default();
        for (target, url) in iter {
            match target {
                UploadTarget::ProfileImage => resolved.image = Some(url),
                UploadTarget::EducationLogo(index) => {
                    resolved.logos.insert(index, url);
                }
            }
        }
        resolved
    }
}

impl ProfileUpdate {
    /// Parses the multipart form
    ///
    /// Malformed JSON in `newEducation`, `newExperience`, `education` or
    /// `experience` fails here with a validation error, before any upload.
    pub fn from_form(mut form: FormData) -> Result<Self, AppError> {
        let mut update = ProfileUpdate::default();

        for name in SCALAR_FIELDS {
            if let Some(value) = form.texts(name).first() {
                update.fields.insert(name, value.clone());
            }
        }

        update.new_education = parse_json(&form, "newEducation")?;
        update.new_experience = parse_json(&form, "newExperience")?;
        update.education = parse_json(&form, "education")?;
        update.experience = parse_json(&form, "experience")?;
        update.remove_education_index = form
            .text("removeEducationIndex")
            .map(|s| IndexInput::Text(s.to_string()));
        update.remove_experience_index = form
            .text("removeExperienceIndex")
            .map(|s| IndexInput::Text(s.to_string()));

        update.image = form.take_file("image");
        for file in form.take_all_files() {
            match logo_index(&file.field) {
                Some(index) => {
                    update.education_logos.entry(index).or_insert(file);
                }
                None => debug!("Ignoring unexpected file field {}", file.field),
            }
        }

        Ok(update)
    }

    /// Drops logo files whose index falls outside the education list this
    /// update will produce, so they are never sent to the media host
    ///
    /// Returns how many files were dropped.
    pub fn discard_unplaced_logos(&mut self, current: &[Education]) -> usize {
        let len = match &self.education {
            Some(replacement) => replacement.len(),
            None => appended_then_removed(
                current,
                self.new_education.as_ref(),
                self.remove_education_index.as_ref(),
            )
            .len(),
        };

        let before = self.education_logos.len();
        self.education_logos.retain(|index, _| *index < len);
        let dropped = before - self.education_logos.len();
        if dropped > 0 {
            debug!("Skipping {} logo file(s) beyond {} education entries", dropped, len);
        }
        dropped
    }

    /// Files to upload, each tagged with where its URL belongs
    pub fn upload_tasks(&self) -> Vec<(UploadTarget, &UploadedFile)> {
        let image = self
            .image
            .iter()
            .map(|file| (UploadTarget::ProfileImage, file));
        let logos = self
            .education_logos
            .iter()
            .map(|(index, file)| (UploadTarget::EducationLogo(*index), file));
        image.chain(logos).collect()
    }

    /// Computes the new field values and writes them onto `profile`
    ///
    /// Only fields named by the payload change:
    ///
    /// - scalars present in the request are overwritten
    /// - the image is replaced only when a new one was uploaded
    /// - education/experience: append the new entry, then drop the entry at
    ///   the removal index (ignored when out of range); a full replacement
    ///   list, when supplied, overrides both
    /// - each education logo comes from a file uploaded for that index, else
    ///   from the stored entry at the same index, else stays unset
    ///
    /// A logo URL sent inside a replacement entry is intentionally overridden
    /// by the stored logo at the same index, even when the client reordered
    /// the entries.
    pub fn apply(&self, profile: &mut Profile, uploads: &ResolvedUploads) {
        for (name, value) in &self.fields {
            let value = Some(value.clone());
            match *name {
                "name" => profile.name = value,
                "bio" => profile.bio = value,
                "gender" => profile.gender = value,
                "dob" => profile.dob = value,
                "profession" => profile.profession = value,
                "phone" => profile.phone = value,
                "linkedin" => profile.linkedin = value,
                "facebook" => profile.facebook = value,
                "youtube" => profile.youtube = value,
                "address" => profile.address = value,
                _ => {}
            }
        }

        if let Some(url) = &uploads.image {
            profile.image = Some(url.clone());
        }

        let education = match &self.education {
            Some(replacement) => replacement
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    let mut entry = entry.clone();
                    if let Some(url) = uploads.logos.get(&index) {
                        entry.logo = Some(url.clone());
                    } else if let Some(stored) =
                        profile.education.get(index).and_then(|e| e.logo.clone())
                    {
                        entry.logo = Some(stored);
                    }
                    entry
                })
                .collect(),
            None => {
                let mut education = appended_then_removed(
                    &profile.education,
                    self.new_education.as_ref(),
                    self.remove_education_index.as_ref(),
                );
                for (index, url) in &uploads.logos {
                    match education.get_mut(*index) {
                        Some(entry) => entry.logo = Some(url.clone()),
                        None => debug!("Dropping logo for missing education entry {}", index),
                    }
                }
                education
            }
        };

        let experience = match &self.experience {
            Some(replacement) => replacement.clone(),
            None => appended_then_removed(
                &profile.experience,
                self.new_experience.as_ref(),
                self.remove_experience_index.as_ref(),
            ),
        };

        profile.education = education;
        profile.experience = experience;
    }
}

/// Uploads every file of the update concurrently
///
/// Any failure aborts the whole batch.
pub async fn upload_all(
    uploader: &dyn MediaUploader,
    update: &ProfileUpdate,
) -> Result<ResolvedUploads, UploadError> {
    let uploads = update.upload_tasks().into_iter().map(|(target, file)| async move {
        let url = uploader.upload(file, UploadOptions::AUTO).await?;
        Ok::<_, UploadError>((target, url))
    });

    Ok(try_join_all(uploads).await?.into_iter().collect())
}

fn appended_then_removed<T: Clone>(
    current: &[T],
    new_entry: Option<&T>,
    remove_index: Option<&IndexInput>,
) -> Vec<T> {
    let mut entries = current.to_vec();
    if let Some(entry) = new_entry {
        entries.push(entry.clone());
    }
    if let Some(index) = remove_index.and_then(IndexInput::as_index) {
        if index < entries.len() {
            entries.remove(index);
        }
    }
    entries
}

fn parse_json<T: DeserializeOwned>(form: &FormData, name: &str) -> Result<Option<T>, AppError> {
    form.text(name)
        .map(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| AppError::validation(format!("Invalid {} payload: {}", name, e)))
        })
        .transpose()
}

/// Parses `education[N][logo]` into `N`
fn logo_index(field: &str) -> Option<usize> {
    field
        .strip_prefix("education[")?
        .strip_suffix("][logo]")?
        .parse()
        .ok()
}
