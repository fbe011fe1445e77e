//! 永続ミラーの実装
//!
//! ## 概要
//!
//! このモジュールは `RoomMirror` / `MirrorSink` trait の具体的な実装を提供します。
//! ミラーはベストエフォートであり、インメモリの変更経路から完全に切り離されます。
//!
//! ## 実装
//!
//! - `fs`: ファイルシステムへ JSON を書き出すバックエンド
//! - `worker`: 有界キュー + バックグラウンドワーカーによる write-behind 投入口

pub mod fs;
pub mod worker;

pub use fs::FsRoomMirror;
pub use worker::MirrorWriter;
