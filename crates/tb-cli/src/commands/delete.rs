//! `tb delete`: remove a block.

use std::io::Write;

use anyhow::Result;
use tb_db::Database;

use super::Session;
use super::util::{explain, format_day, format_span, resolve_block};

pub fn run<W: Write>(writer: &mut W, db: &mut Database, session: &Session, id: &str) -> Result<()> {
    let block = resolve_block(db, id)?;
    let deleted = session
        .planner()
        .delete_block(db, &block.id)
        .map_err(|err| explain(err, &session.calendar))?;
    writeln!(
        writer,
        "Deleted {}  {} {}  {}",
        deleted.id.short(8),
        format_day(deleted.day(&session.calendar)),
        format_span(&deleted, &session.calendar),
        deleted.title
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{at, output, session, stored};
    use insta::assert_snapshot;
    use tb_core::{BlockStatus, BlockStore};

    #[test]
    fn delete_removes_block() {
        let mut db = Database::open_in_memory().unwrap();
        let block = stored(&mut db, "blk-1", "Write", (at(9, 0), at(10, 0)), None, BlockStatus::NotStarted);

        let mut out = Vec::new();
        run(&mut out, &mut db, &session(8), "blk-1").unwrap();
        assert_snapshot!(output(out), @"Deleted blk-1  Mon, Mar 10 2025 09:00-10:00  Write");
        assert!(db.load_block(&block.id).unwrap().is_none());
    }

    #[test]
    fn ambiguous_prefix_is_refused() {
        let mut db = Database::open_in_memory().unwrap();
        stored(&mut db, "blk-1", "A", (at(9, 0), at(10, 0)), None, BlockStatus::NotStarted);
        stored(&mut db, "blk-2", "B", (at(11, 0), at(12, 0)), None, BlockStatus::NotStarted);

        let err = run(&mut Vec::<u8>::new(), &mut db, &session(8), "blk").unwrap_err();
        assert_eq!(err.to_string(), "'blk' matches 2 blocks; use more of the ID");
        assert_eq!(db.find_blocks_by_prefix("blk").unwrap().len(), 2);
    }
}
