//! # Folio Import
//!
//! 업로드된 보유 종목 파일(xlsx, xls, csv)을 정규 보유 종목으로 변환합니다.
//!
//! 처리 순서:
//! 1. [`gate`] - 크기, 확장자, MIME 검사
//! 2. [`workbook`] - 시트 선택 및 셀 그리드 로드
//! 3. [`header`] - 헤더 행 탐지
//! 4. [`columns`] - 동의어 테이블 기반 열 매핑
//! 5. [`parser`] - 행 파싱, 분류, 검증, 중복 처리
//!
//! 행 처리 루프는 [`Deadline`]을 검사하여 시간 예산을 초과하면 중단합니다.

pub mod columns;
pub mod deadline;
pub mod error;
pub mod gate;
pub mod header;
pub mod parser;
pub mod workbook;

pub use deadline::Deadline;
pub use error::{ImportError, ImportResult};
pub use gate::FileKind;
pub use parser::{parse_holdings_file, parse_sheet, ParseOptions, ParseOutcome, ParseSummary, SkippedRow};
pub use workbook::{Cell, Sheet};
