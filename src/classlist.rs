//! Lines of the class list consumed by `-XX:SharedClassListFile`.

use std::fmt;
use std::path::Path;

use crate::identity::ClassId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail<'a> {
    /// Classes of the boot, platform and app loaders only need their id.
    Trusted { id: &'a ClassId },
    /// Custom-loader classes carry everything the archiver needs to load
    /// them again.
    Custom {
        id: &'a ClassId,
        parent: &'a ClassId,
        interfaces: &'a [ClassId],
        source: &'a Path,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassListEntry<'a> {
    pub internal_name: &'a str,
    pub detail: Option<Detail<'a>>,
}

impl fmt::Display for ClassListEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.internal_name)?;
        match &self.detail {
            None => Ok(()),
            Some(Detail::Trusted { id }) => write!(f, " id: {id}"),
            Some(Detail::Custom {
                id,
                parent,
                interfaces,
                source,
            }) => {
                write!(f, " id: {id} super: {parent}")?;
                if !interfaces.is_empty() {
                    f.write_str(" interfaces:")?;
                    for interface in interfaces.iter() {
                        write!(f, " {interface}")?;
                    }
                }
                write!(f, " source: {}", source.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name() {
        let entry = ClassListEntry {
            internal_name: "java/lang/Object",
            detail: None,
        };
        assert_eq!(entry.to_string(), "java/lang/Object");
    }

    #[test]
    fn trusted_entry_shows_only_id() {
        let id = ClassId::Compact(16);
        let entry = ClassListEntry {
            internal_name: "java/lang/String",
            detail: Some(Detail::Trusted { id: &id }),
        };
        assert_eq!(entry.to_string(), "java/lang/String id: 16");
    }

    #[test]
    fn custom_entry_shows_dependencies_and_source() {
        let id = ClassId::Compact(4096);
        let parent = ClassId::Compact(0);
        let interfaces = [ClassId::Compact(24), ClassId::Compact(40)];
        let entry = ClassListEntry {
            internal_name: "com/example/Service",
            detail: Some(Detail::Custom {
                id: &id,
                parent: &parent,
                interfaces: &interfaces,
                source: Path::new("/app/lib.jar"),
            }),
        };
        assert_eq!(
            entry.to_string(),
            "com/example/Service id: 4096 super: 0 interfaces: 24 40 source: /app/lib.jar"
        );
    }

    #[test]
    fn custom_entry_without_interfaces_omits_field() {
        let id = ClassId::Raw("0x0000000800c01000".to_string());
        let parent = ClassId::Raw("0x0000000800001000".to_string());
        let entry = ClassListEntry {
            internal_name: "com/example/Plain",
            detail: Some(Detail::Custom {
                id: &id,
                parent: &parent,
                interfaces: &[],
                source: Path::new("/app/lib.jar"),
            }),
        };
        assert_eq!(
            entry.to_string(),
            "com/example/Plain id: 0x0000000800c01000 super: 0x0000000800001000 source: /app/lib.jar"
        );
    }
}
