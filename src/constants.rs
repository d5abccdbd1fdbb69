// Genetic Algorithm
pub const POPULATION_SIZE: usize = 10;
pub const GENERATIONS: u32 = 10;
pub const MUTATION_RATE: f64 = 0.05; // chance per integer gene, and the real-gene step
pub const SURVIVOR_FRACTION: f64 = 0.3;
pub const LEADERBOARD_SIZE: usize = 10;
pub const DEFAULT_SAMPLE_COUNT: usize = 20;

// Gene sampling ranges (lower inclusive, upper exclusive)
pub const INT_GENE_MIN: u32 = 0;
pub const INT_GENE_MAX: u32 = 100;
pub const REAL_GENE_MIN: f64 = 0.0;
pub const REAL_GENE_MAX: f64 = 2.0;

// Evaluation
pub const MAX_CONCURRENT_EVALUATIONS: usize = 8;
pub const GAME_DURATION_MS: u64 = 60_000;
pub const INCREMENT_MS: u64 = 0;
// Games still running after this many plies are adjudicated as draws.
pub const MAX_PLIES: u32 = 400;

// Reference engine
pub const ENGINE_PATH: &str = "stockfish";
pub const ENGINE_DEPTH: u8 = 10;
pub const ENGINE_SKILL_LEVEL: &str = "20";
pub const ENGINE_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
pub const ENGINE_QUERY_TIMEOUT_MS: u64 = 30_000;
pub const ENGINE_TEARDOWN_GRACE_MS: u64 = 200;

// Files
pub const OPENING_BOOK_PATH: &str = "resources/openings.txt";
pub const OUTPUT_DIR: &str = "results";
pub const BEST_GENOME_FILE: &str = "best_genome.json";
pub const LEADERBOARD_FILE: &str = "leaderboard.csv";
pub const CONFIG_SNAPSHOT_FILE: &str = "run_config.json";

// --- Piece values ---
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

// One unit of a real-valued gene, in centipawns
pub const HEURISTIC_UNIT_CP: f64 = 50.0;
