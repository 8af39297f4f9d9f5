use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_FAT_JAR_TMP;

#[derive(Debug, Clone, Parser)]
#[command(name = "cl4cds")]
#[command(version)]
#[command(about = "Convert a -Xlog:class+load trace into a class list for -XX:SharedClassListFile")]
pub struct Cli {
    /// Class trace obtained with -Xlog:class+load=debug (stdin if omitted)
    #[arg(value_name = "CLASS_TRACE_FILE")]
    pub input: Option<PathBuf>,

    /// Class list to write (stdout if omitted)
    #[arg(value_name = "CLASS_LIST_FILE", requires = "input")]
    pub output: Option<PathBuf>,

    /// Subtract java.lang.Object's klass address from all ids so they fit in 32 bits
    #[arg(
        long,
        env = "CL4CDS_COMPACT_IDS",
        value_name = "BOOL",
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub compact_ids: bool,

    /// Print additional tracing to stderr
    #[arg(
        long,
        env = "CL4CDS_DEBUG",
        value_name = "BOOL",
        default_value_t = false,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub debug: bool,

    /// Also accept classes loaded from plain class files in directories
    #[arg(
        long,
        env = "CL4CDS_DUMP_FROM_CLASS_FILE",
        value_name = "BOOL",
        default_value_t = false,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub dump_from_class_file: bool,

    /// Directory that jars nested inside fat jars are extracted to
    #[arg(long, env = "CL4CDS_FAT_JAR_TMP", value_name = "DIR", default_value = DEFAULT_FAT_JAR_TMP)]
    pub fat_jar_tmp: PathBuf,

    /// Write bare class names only, without id, super, interfaces and source
    #[arg(
        long,
        env = "CL4CDS_CLASSES_ONLY",
        value_name = "BOOL",
        default_value_t = false,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub classes_only: bool,

    /// Print a JSON summary of the conversion to stderr
    #[arg(long)]
    pub stats: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["cl4cds"]).unwrap();
        assert!(cli.compact_ids);
        assert!(!cli.debug);
        assert!(!cli.dump_from_class_file);
        assert!(!cli.classes_only);
        assert_eq!(cli.fat_jar_tmp, PathBuf::from("./tmp"));
        assert!(cli.input.is_none() && cli.output.is_none());
    }

    #[test]
    fn boolean_options_accept_bare_and_explicit_values() {
        let cli = Cli::try_parse_from([
            "cl4cds",
            "--compact-ids=false",
            "--debug",
            "--classes-only=true",
            "trace.log",
            "classes.lst",
        ])
        .unwrap();
        assert!(!cli.compact_ids);
        assert!(cli.debug);
        assert!(cli.classes_only);
        assert_eq!(cli.input, Some(PathBuf::from("trace.log")));
        assert_eq!(cli.output, Some(PathBuf::from("classes.lst")));
    }

    #[test]
    fn bare_flag_does_not_swallow_positional() {
        let cli = Cli::try_parse_from(["cl4cds", "--debug", "trace.log"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.input, Some(PathBuf::from("trace.log")));
    }

    #[test]
    fn at_most_two_positionals() {
        assert!(Cli::try_parse_from(["cl4cds", "a", "b", "c"]).is_err());
    }
}
