//! Request operation descriptors.
//!
//! Every top-level request is captured as an [`Operation`] value carrying
//! its kind and original arguments. The descriptor is the unit of replay:
//! when a request has to wait for a token refresh, the descriptor goes into
//! the retry queue and the drain loop re-submits it as-is. A remove-tags
//! request therefore replays as a remove-tags request; the replay path
//! cannot drift to a different operation.

use url::form_urlencoded;

use crate::protocol;

/// A tag or feedback request, tagged by kind and carrying its original
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operation {
    /// Tag one or more image URLs.
    Tag {
        urls: Vec<String>,
        local_id: Option<String>,
    },
    /// Attach tags to previously tagged documents.
    AddTags {
        docids: Vec<String>,
        tags: Vec<String>,
        local_id: Option<String>,
    },
    /// Detach tags from previously tagged documents.
    RemoveTags {
        docids: Vec<String>,
        tags: Vec<String>,
        local_id: Option<String>,
    },
}

impl Operation {
    /// Endpoint path for this operation.
    pub(crate) fn path(&self) -> &'static str {
        match self {
            Operation::Tag { .. } => protocol::TAG_PATH,
            Operation::AddTags { .. } | Operation::RemoveTags { .. } => protocol::FEEDBACK_PATH,
        }
    }

    /// Encode the form body, appending the active model name when set.
    pub(crate) fn encode_form(&self, model: Option<&str>) -> String {
        let mut form = form_urlencoded::Serializer::new(String::new());

        match self {
            Operation::Tag { urls, local_id } => {
                for url in urls {
                    form.append_pair("url", url);
                }
                append_local_id(&mut form, local_id);
            }
            Operation::AddTags {
                docids,
                tags,
                local_id,
            } => {
                append_feedback(&mut form, docids, tags, "add_tags", local_id);
            }
            Operation::RemoveTags {
                docids,
                tags,
                local_id,
            } => {
                append_feedback(&mut form, docids, tags, "remove_tags", local_id);
            }
        }

        if let Some(model) = model {
            form.append_pair("model", model);
        }

        form.finish()
    }
}

fn append_local_id(form: &mut form_urlencoded::Serializer<'_, String>, local_id: &Option<String>) {
    if let Some(local_id) = local_id {
        form.append_pair("local_id", local_id);
    }
}

fn append_feedback(
    form: &mut form_urlencoded::Serializer<'_, String>,
    docids: &[String],
    tags: &[String],
    tags_key: &str,
    local_id: &Option<String>,
) {
    for docid in docids {
        form.append_pair("docids", docid);
    }
    append_local_id(form, local_id);
    for tag in tags {
        form.append_pair(tags_key, tag);
    }
}
