use std::path::{Path, PathBuf};

use clap::{value_parser, ArgAction::*, ArgMatches};
use keyframe_dedup_lib::*;

use super::{concat::DEFAULT_CONCAT_OUTPUT, keyframes::DEFAULT_KEYFRAMES_DIR_NAME};
use crate::app::*;

// subcommands
const CMD_FIND: &str = "find";
const CMD_EXTRACT: &str = "extract";
const CMD_MOVE_DUPS: &str = "move-dups";
const CMD_CONCAT: &str = "concat";

// paths
const VIDEOS_DIR: &str = "Videos directory";
const KEYFRAMES_DIR: &str = "Keyframes directory";
const GROUPS_FILE: &str = "Duplicates file";
const VIDEO_EXTS: &str = "Video extensions";
const VIDEO_EXT: &str = "Video extension";
const FRAME_EXTS: &str = "Frame extensions";

//search configuration
const DISTANCE: &str = "Distance threshold";
const RATIO: &str = "Match ratio";
const TRANSITIVE: &str = "Transitive grouping";
const MAX_IN_FLIGHT: &str = "Max in flight";

//output settings
const OUTPUT_FILE: &str = "Output file";
const OUTPUT_FORMAT: &str = "Format";
const RUN_FFMPEG: &str = "Run ffmpeg";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 15] = [
    //
    // paths
    VIDEOS_DIR,
    KEYFRAMES_DIR,
    GROUPS_FILE,
    VIDEO_EXTS,
    VIDEO_EXT,
    FRAME_EXTS,
    //
    //search modifiers
    DISTANCE,
    RATIO,
    TRANSITIVE,
    MAX_IN_FLIGHT,
    //
    //outputs
    OUTPUT_FILE,
    OUTPUT_FORMAT,
    RUN_FFMPEG,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

const DEFAULT_GROUPS_FILE: &str = "duplicates.json";
const DEFAULT_VIDEO_EXT: &str = "mp4";
const DEFAULT_EXTRACT_IN_FLIGHT: &str = "4";

fn get_ordering(arg_name: &str) -> usize {
    match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
        Some(idx) => idx,
        None => {
            panic!("argument not assigned a display order: {arg_name:?}");
        }
    }
}

fn videos_dir_arg() -> clap::Arg {
    clap::Arg::new(VIDEOS_DIR)
        .long("videos")
        .required(true)
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .help("Directory containing the video files")
        .display_order(get_ordering(VIDEOS_DIR))
}

fn video_ext_arg() -> clap::Arg {
    clap::Arg::new(VIDEO_EXT)
        .long("video-ext")
        .num_args(1)
        .default_value(DEFAULT_VIDEO_EXT)
        .help("Extension (without the dot) of the video files. The video of asset <id> is <videos>/<id>.<ext>")
        .display_order(get_ordering(VIDEO_EXT))
}

fn max_in_flight_arg(default: String) -> clap::Arg {
    clap::Arg::new(MAX_IN_FLIGHT)
        .long("max-in-flight")
        .num_args(1)
        .value_parser(value_parser!(u64).range(1..))
        .default_value(default)
        .help("Maximum number of items processed at once")
        .display_order(get_ordering(MAX_IN_FLIGHT))
}

fn build_find_cmd() -> clap::Command {
    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut cmd = clap::Command::new(CMD_FIND)
        .about("Fingerprint sampled keyframes and write groups of duplicate videos to a JSON file");

    cmd = cmd.arg(
        clap::Arg::new(KEYFRAMES_DIR)
            .long("keyframes")
            .required(true)
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Directory holding one sub-directory of keyframes per video. Sub-directory names become video IDs")
            .display_order(get_ordering(KEYFRAMES_DIR)),
    );

    cmd = cmd.arg(
        clap::Arg::new(OUTPUT_FILE)
            .long("output")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .default_value(DEFAULT_GROUPS_FILE)
            .help("Where to write the duplicate groups")
            .display_order(get_ordering(OUTPUT_FILE)),
    );

    cmd = cmd.arg(
        clap::Arg::new(DISTANCE)
            .long("distance")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .default_value(DEFAULT_DISTANCE_THRESHOLD.to_string())
            .help("Maximum number of differing bits (out of 64) for two keyframes to match")
            .display_order(get_ordering(DISTANCE)),
    );

    cmd = cmd.arg(
        clap::Arg::new(RATIO)
            .long("ratio")
            .num_args(1)
            .value_parser(value_parser!(f64))
            .default_value(DEFAULT_MATCH_RATIO.to_string())
            .help("Matching keyframe pairs, divided by the keyframe count of the shorter video, needed for two videos to be duplicates. A number between 0.0 and 1.0")
            .display_order(get_ordering(RATIO)),
    );

    cmd = cmd.arg(
        clap::Arg::new(TRANSITIVE)
            .long("transitive")
            .num_args(0)
            .action(SetTrue)
            .help("Group videos that are linked through a chain of duplicates, instead of grouping greedily. Compares every pair of videos")
            .display_order(get_ordering(TRANSITIVE)),
    );

    cmd = cmd.arg(max_in_flight_arg(DEFAULT_MAX_IN_FLIGHT.to_string()));

    cmd = cmd.arg(
        clap::Arg::new(FRAME_EXTS)
            .long("frame-exts")
            .num_args(1..)
            .value_delimiter(',')
            .action(Append)
            .default_value("jpg")
            .help("Extensions of keyframe images. Extensions must be comma separated with no spaces, e.g '--frame-exts jpg,png'")
            .display_order(get_ordering(FRAME_EXTS)),
    );

    cmd = cmd.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("output-format")
            .help("Whether to also print the groups as normal text, or JSON")
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .num_args(1)
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    cmd
}

fn build_extract_cmd() -> clap::Command {
    let mut cmd = clap::Command::new(CMD_EXTRACT).about("Sample the keyframes of every video with ffmpeg");

    cmd = cmd.arg(videos_dir_arg());

    cmd = cmd.arg(
        clap::Arg::new(KEYFRAMES_DIR)
            .long("keyframes")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where to put the keyframes. Defaults to <videos>/keyframes")
            .display_order(get_ordering(KEYFRAMES_DIR)),
    );

    cmd = cmd.arg(
        clap::Arg::new(VIDEO_EXTS)
            .long("video-exts")
            .num_args(1..)
            .value_delimiter(',')
            .action(Append)
            .default_value(DEFAULT_VIDEO_EXT)
            .help("Extensions of the video files to sample. Extensions must be comma separated with no spaces")
            .display_order(get_ordering(VIDEO_EXTS)),
    );

    cmd = cmd.arg(max_in_flight_arg(DEFAULT_EXTRACT_IN_FLIGHT.to_string()));

    cmd
}

fn build_move_dups_cmd() -> clap::Command {
    let mut cmd = clap::Command::new(CMD_MOVE_DUPS).about("Move every duplicate video into <videos>/duplicates");

    cmd = cmd.arg(videos_dir_arg());

    cmd = cmd.arg(
        clap::Arg::new(GROUPS_FILE)
            .long("groups")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .default_value(DEFAULT_GROUPS_FILE)
            .help("Duplicate groups, as written by the find command")
            .display_order(get_ordering(GROUPS_FILE)),
    );

    cmd = cmd.arg(video_ext_arg());

    cmd
}

fn build_concat_cmd() -> clap::Command {
    let mut cmd =
        clap::Command::new(CMD_CONCAT).about("List the videos that are not duplicates, and optionally join them together");

    cmd = cmd.arg(videos_dir_arg());

    cmd = cmd.arg(
        clap::Arg::new(OUTPUT_FILE)
            .long("output")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where to write the joined video. Defaults to <videos>/concatenated_video.mp4")
            .display_order(get_ordering(OUTPUT_FILE)),
    );

    cmd = cmd.arg(video_ext_arg());

    cmd = cmd.arg(
        clap::Arg::new(RUN_FFMPEG)
            .long("run-ffmpeg")
            .num_args(0)
            .action(SetTrue)
            .help("Join the listed videos with ffmpeg. Without this flag only the list is written")
            .display_order(get_ordering(RUN_FFMPEG)),
    );

    cmd
}

fn build_app() -> clap::Command {
    let mut clap_app = clap::Command::new("Keyframe duplicate finder")
        .version(clap::crate_version!())
        .about("Detect near-duplicate video files by comparing their keyframes")
        .subcommand_required(true)
        .arg_required_else_help(true);

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .global(true)
            .help("Reduced verbosity")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .global(true)
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
        .subcommand(build_find_cmd())
        .subcommand(build_extract_cmd())
        .subcommand(build_move_dups_cmd())
        .subcommand(build_concat_cmd())
}

pub fn parse_args() -> AppCfg {
    //capture the cwd once, to minimize the risk of working with two values if it is changed by the OS at runtime.
    let cwd = std::env::current_dir()
        .unwrap_or_else(|e| print_error_and_quit(eyre::Report::new(e).wrap_err("Failed to read the working directory")));

    let args = build_app().get_matches();
    cfg_from_matches(&cwd, &args)
}

fn strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn string(args: &ArgMatches, id: &str) -> String {
    args.get_one::<String>(id)
        .cloned()
        .expect("This argument has a default value")
}

fn path(cwd: &Path, args: &ArgMatches, id: &str) -> Option<PathBuf> {
    args.get_one::<PathBuf>(id).map(|p| absolutify_path(cwd, p))
}

fn max_in_flight(args: &ArgMatches) -> usize {
    *args
        .get_one::<u64>(MAX_IN_FLIGHT)
        .expect("This argument has a default value") as usize
}

fn cfg_from_matches(cwd: &Path, args: &ArgMatches) -> AppCfg {
    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let required = "This argument is required or has a default value";

    let command = match args.subcommand() {
        Some((CMD_FIND, args)) => AppCommand::Find(FindCfg {
            keyframes_dir: path(cwd, args, KEYFRAMES_DIR).expect(required),
            output_path: path(cwd, args, OUTPUT_FILE).expect(required),
            distance_threshold: *args.get_one::<u32>(DISTANCE).expect(required),
            match_ratio: *args.get_one::<f64>(RATIO).expect(required),
            max_in_flight: max_in_flight(args),
            frame_exts: strings(args, FRAME_EXTS),
            policy: if args.get_flag(TRANSITIVE) {
                ClusterPolicy::Transitive
            } else {
                ClusterPolicy::Greedy
            },
            output_format: *args.get_one::<OutputFormat>(OUTPUT_FORMAT).expect(required),
        }),

        Some((CMD_EXTRACT, args)) => {
            let videos_dir = path(cwd, args, VIDEOS_DIR).expect(required);
            AppCommand::Extract(ExtractCfg {
                keyframes_dir: path(cwd, args, KEYFRAMES_DIR)
                    .unwrap_or_else(|| videos_dir.join(DEFAULT_KEYFRAMES_DIR_NAME)),
                videos_dir,
                video_exts: strings(args, VIDEO_EXTS),
                max_in_flight: max_in_flight(args),
            })
        }

        Some((CMD_MOVE_DUPS, args)) => AppCommand::MoveDups(MoveDupsCfg {
            videos_dir: path(cwd, args, VIDEOS_DIR).expect(required),
            groups_path: path(cwd, args, GROUPS_FILE).expect(required),
            video_ext: string(args, VIDEO_EXT),
        }),

        Some((CMD_CONCAT, args)) => {
            let videos_dir = path(cwd, args, VIDEOS_DIR).expect(required);
            AppCommand::Concat(ConcatCfg {
                output_path: path(cwd, args, OUTPUT_FILE).unwrap_or_else(|| videos_dir.join(DEFAULT_CONCAT_OUTPUT)),
                videos_dir,
                video_ext: string(args, VIDEO_EXT),
                run_ffmpeg: args.get_flag(RUN_FFMPEG),
            })
        }

        //clap guarantees a known subcommand is present.
        other => unreachable!("unexpected subcommand: {:?}", other.map(|(name, _)| name)),
    };

    AppCfg { command, verbosity }
}

fn absolutify_path(cwd: &Path, path: &Path) -> PathBuf {
    //get the absolute path if it is not absolute, by prepending the cwd.
    let path = if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    };

    //canonicalizing fails for paths that do not exist yet (such as output files), which is fine.
    let p = path.canonicalize().unwrap_or(path);

    p
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> AppCfg {
        let cwd = Path::new("/nonexistent/work");
        let matches = build_app()
            .try_get_matches_from(std::iter::once("keyframe_dedup").chain(args.iter().copied()))
            .unwrap();
        cfg_from_matches(cwd, &matches)
    }

    #[test]
    fn test_app_is_well_formed() {
        build_app().debug_assert();
    }

    #[test]
    fn test_find_defaults() {
        let cfg = parse(&["find", "--keyframes", "kf"]);

        assert_eq!(cfg.verbosity, ReportVerbosity::Default);
        assert_eq!(
            cfg.command,
            AppCommand::Find(FindCfg {
                keyframes_dir: PathBuf::from("/nonexistent/work/kf"),
                output_path: PathBuf::from("/nonexistent/work/duplicates.json"),
                distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
                match_ratio: DEFAULT_MATCH_RATIO,
                max_in_flight: DEFAULT_MAX_IN_FLIGHT,
                frame_exts: vec!["jpg".to_string()],
                policy: ClusterPolicy::Greedy,
                output_format: OutputFormat::Normal,
            })
        );
    }

    #[test]
    fn test_find_overrides() {
        let cfg = parse(&[
            "--verbose",
            "find",
            "--keyframes",
            "/abs/kf",
            "--output",
            "out.json",
            "--distance",
            "8",
            "--ratio",
            "0.75",
            "--max-in-flight",
            "3",
            "--frame-exts",
            "jpg,png",
            "--transitive",
            "--output-format",
            "json",
        ]);

        assert_eq!(cfg.verbosity, ReportVerbosity::Verbose);
        let AppCommand::Find(find) = cfg.command else {
            panic!("expected find, got {:?}", cfg.command);
        };
        assert_eq!(find.keyframes_dir, PathBuf::from("/abs/kf"));
        assert_eq!(find.distance_threshold, 8);
        assert_eq!(find.match_ratio, 0.75);
        assert_eq!(find.max_in_flight, 3);
        assert_eq!(find.frame_exts, ["jpg", "png"]);
        assert_eq!(find.policy, ClusterPolicy::Transitive);
        assert_eq!(find.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_zero_in_flight_is_rejected() {
        let result = build_app().try_get_matches_from(["keyframe_dedup", "find", "--keyframes", "kf", "--max-in-flight", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        let result = build_app().try_get_matches_from(["keyframe_dedup", "--quiet", "--verbose", "find", "--keyframes", "kf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_defaults_keyframes_under_videos() {
        let cfg = parse(&["extract", "--videos", "vids", "--quiet"]);

        assert_eq!(cfg.verbosity, ReportVerbosity::Quiet);
        assert_eq!(
            cfg.command,
            AppCommand::Extract(ExtractCfg {
                videos_dir: PathBuf::from("/nonexistent/work/vids"),
                keyframes_dir: PathBuf::from("/nonexistent/work/vids/keyframes"),
                video_exts: vec!["mp4".to_string()],
                max_in_flight: 4,
            })
        );
    }

    #[test]
    fn test_move_dups_and_concat() {
        let cfg = parse(&["move-dups", "--videos", "vids", "--video-ext", "mkv"]);
        assert_eq!(
            cfg.command,
            AppCommand::MoveDups(MoveDupsCfg {
                videos_dir: PathBuf::from("/nonexistent/work/vids"),
                groups_path: PathBuf::from("/nonexistent/work/duplicates.json"),
                video_ext: "mkv".to_string(),
            })
        );

        let cfg = parse(&["concat", "--videos", "vids", "--run-ffmpeg"]);
        assert_eq!(
            cfg.command,
            AppCommand::Concat(ConcatCfg {
                videos_dir: PathBuf::from("/nonexistent/work/vids"),
                output_path: PathBuf::from("/nonexistent/work/vids/concatenated_video.mp4"),
                video_ext: "mp4".to_string(),
                run_ffmpeg: true,
            })
        );
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(build_app().try_get_matches_from(["keyframe_dedup"]).is_err());
    }
}
