/// Who defined a class, as far as the loader descriptor tells.
///
/// The descriptor format changed between JDK releases, so the trusted
/// loaders are recognized by substrings seen in each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    Bootstrap,
    Platform,
    App,
    Custom,
}

/// JDK 9/10 print the boot loader as exactly this.
const NULL_LOADER: &str = "NULL class loader";

const LOADER_TABLE: &[(&str, LoaderKind)] = &[
    // JDK 11
    ("of <bootloader>", LoaderKind::Bootstrap),
    // JDK 12+
    ("of 'bootstrap'", LoaderKind::Bootstrap),
    (
        "jdk/internal/loader/ClassLoaders$PlatformClassLoader",
        LoaderKind::Platform,
    ),
    (
        "jdk/internal/loader/ClassLoaders$AppClassLoader",
        LoaderKind::App,
    ),
];

impl LoaderKind {
    pub fn classify(descriptor: &str) -> Self {
        if descriptor == NULL_LOADER {
            return LoaderKind::Bootstrap;
        }
        LOADER_TABLE
            .iter()
            .find(|(needle, _)| descriptor.contains(needle))
            .map(|(_, kind)| *kind)
            .unwrap_or(LoaderKind::Custom)
    }

    /// The VM resolves super types of these loaders' classes itself, so
    /// their load order is already consistent.
    pub fn is_trusted(self) -> bool {
        !matches!(self, LoaderKind::Custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_descriptors_across_jdk_versions() {
        let cases = [
            ("NULL class loader", LoaderKind::Bootstrap),
            ("loader data: 0x00007f of <bootloader>", LoaderKind::Bootstrap),
            ("loader data: 0x00007f of 'bootstrap'", LoaderKind::Bootstrap),
            (
                "0x0000000800a1 a 'jdk/internal/loader/ClassLoaders$PlatformClassLoader'",
                LoaderKind::Platform,
            ),
            (
                "0x0000000800b2 a 'jdk/internal/loader/ClassLoaders$AppClassLoader'",
                LoaderKind::App,
            ),
            (
                "0x0000000800c3 a 'org/springframework/boot/loader/LaunchedURLClassLoader'",
                LoaderKind::Custom,
            ),
        ];
        for (descriptor, expected) in cases {
            assert_eq!(LoaderKind::classify(descriptor), expected, "{descriptor}");
        }
    }

    #[test]
    fn null_loader_must_match_exactly() {
        assert_eq!(
            LoaderKind::classify("not the NULL class loader"),
            LoaderKind::Custom
        );
        assert!(!LoaderKind::Custom.is_trusted());
        assert!(LoaderKind::App.is_trusted());
    }
}
