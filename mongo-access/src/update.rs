use crate::access_config::UpdateValueMode;
use mongodb::bson::{Bson, Document};

/// Builds the combined update document for a field/value map.
///
/// Every entry becomes part of one `$set`, and the last-modified field is
/// stamped with the server time through `$currentDate`.
///
/// # Examples
///
/// ```rust
/// use mongo_access::update::UpdateBuilder;
/// use mongo_access::UpdateValueMode;
/// use mongodb::bson::doc;
///
/// let update = UpdateBuilder::new("lastModified", UpdateValueMode::Native)
///     .set_all(&doc! { "status": "done" })
///     .build();
///
/// assert_eq!(update, doc! {
///     "$set": { "status": "done" },
///     "$currentDate": { "lastModified": true },
/// });
/// ```
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    last_modified_field: String,
    value_mode: UpdateValueMode,
    set: Document,
}

impl UpdateBuilder {
    pub fn new(last_modified_field: &str, value_mode: UpdateValueMode) -> Self {
        UpdateBuilder {
            last_modified_field: last_modified_field.to_string(),
            value_mode,
            set: Document::new(),
        }
    }

    /// Adds one `$set` entry. A later entry for the same field replaces the
    /// earlier one.
    ///
    /// An entry for the last-modified field itself is dropped: the field is
    /// always stamped by `$currentDate`, and the server rejects an update that
    /// both sets and stamps the same path.
    pub fn set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        if field == self.last_modified_field {
            log::warn!(
                "Ignoring update of '{}', it is maintained as the last modified timestamp",
                field
            );
            return self;
        }

        let value = match self.value_mode {
            UpdateValueMode::Native => value.into(),
            UpdateValueMode::Stringify => Bson::String(stringify(value.into())),
        };
        self.set.insert(field, value);
        self
    }

    /// Adds one `$set` entry per field of `fields`, in document order.
    pub fn set_all(self, fields: &Document) -> Self {
        fields
            .iter()
            .fold(self, |builder, (field, value)| builder.set(field, value.clone()))
    }

    /// Returns the combined update document.
    pub fn build(self) -> Document {
        let mut update = Document::new();
        if !self.set.is_empty() {
            update.insert("$set", self.set);
        }
        let mut stamp = Document::new();
        stamp.insert(self.last_modified_field, true);
        update.insert("$currentDate", stamp);
        update
    }
}

fn stringify(value: Bson) -> String {
    match value {
        Bson::String(s) => s,
        Bson::Symbol(s) => s,
        Bson::Null | Bson::Undefined => String::new(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_native_values_keep_their_type() {
        let update = UpdateBuilder::new("lastModified", UpdateValueMode::Native)
            .set_all(&doc! { "status": "done", "qty": 3, "paid": true })
            .build();

        assert_eq!(
            update,
            doc! {
                "$set": { "status": "done", "qty": 3, "paid": true },
                "$currentDate": { "lastModified": true },
            }
        );
    }

    #[test]
    fn test_stringify_values() {
        let oid = ObjectId::new();
        let update = UpdateBuilder::new("lastModified", UpdateValueMode::Stringify)
            .set_all(&doc! { "status": "done", "qty": 3, "paid": true, "ref": oid, "note": Bson::Null })
            .build();

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "done");
        assert_eq!(set.get_str("qty").unwrap(), "3");
        assert_eq!(set.get_str("paid").unwrap(), "true");
        assert_eq!(set.get_str("ref").unwrap(), oid.to_hex());
        assert_eq!(set.get_str("note").unwrap(), "");
    }

    #[test]
    fn test_empty_fields_only_stamp_timestamp() {
        let update = UpdateBuilder::new("updatedAt", UpdateValueMode::Native)
            .set_all(&Document::new())
            .build();

        assert_eq!(update, doc! { "$currentDate": { "updatedAt": true } });
    }

    #[test]
    fn test_last_modified_entry_is_dropped() {
        let update = UpdateBuilder::new("lastModified", UpdateValueMode::Native)
            .set("lastModified", "yesterday")
            .set("status", "done")
            .build();

        assert_eq!(
            update,
            doc! {
                "$set": { "status": "done" },
                "$currentDate": { "lastModified": true },
            }
        );
    }

    #[test]
    fn test_later_entry_wins() {
        let update = UpdateBuilder::new("lastModified", UpdateValueMode::Native)
            .set("status", "open")
            .set("status", "done")
            .build();

        assert_eq!(update.get_document("$set").unwrap().get_str("status").unwrap(), "done");
    }

    #[test]
    fn test_nested_paths_are_passed_through() {
        let update = UpdateBuilder::new("lastModified", UpdateValueMode::Native)
            .set("address.city", "Oslo")
            .build();

        assert_eq!(
            update.get_document("$set").unwrap().get_str("address.city").unwrap(),
            "Oslo"
        );
    }
}
