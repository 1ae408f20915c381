//! 归档 - 业务能力层
//!
//! 把回执 PDF 打包成一个 zip，压缩包内只保留文件名

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, AppResult, DocumentError, FileError};

/// 被视为文档的扩展名
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// 生成的压缩包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBundle {
    pub path: PathBuf,
    /// 压缩包内的文件名（按字母排序）
    pub entries: Vec<String>,
}

/// 压缩包生成器
pub struct ArchiveBuilder {
    archive_path: PathBuf,
}

impl ArchiveBuilder {
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// 只打包给定的文档清单
    pub fn build_from_manifest(&self, documents: &[PathBuf]) -> AppResult<ArchiveBundle> {
        self.write_archive(documents)
    }

    /// 打包目录下所有 PDF
    ///
    /// 不区分是否属于本次运行：目录里残留的旧回执也会被打包
    pub fn build_from_directory(&self, dir: &Path) -> AppResult<ArchiveBundle> {
        let documents = scan_documents(dir)?;
        self.write_archive(&documents)
    }

    fn write_archive(&self, documents: &[PathBuf]) -> AppResult<ArchiveBundle> {
        let archive_display = self.archive_path.display().to_string();
        let zip_err = |source| {
            AppError::Document(DocumentError::Archive {
                path: archive_display.clone(),
                source,
            })
        };

        // 同名文件只保留一份，并按文件名排序
        let mut by_name = std::collections::BTreeMap::new();
        for path in documents {
            let name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            by_name.entry(name).or_insert(path);
        }

        let file = File::create(&self.archive_path)
            .map_err(|e| AppError::file_write_failed(archive_display.clone(), e))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, path) in &by_name {
            let bytes = std::fs::read(path)
                .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
            zip.start_file(name.as_str(), options).map_err(zip_err)?;
            zip.write_all(&bytes)
                .map_err(|e| AppError::file_write_failed(archive_display.clone(), e))?;
            debug!("已加入压缩包: {}", name);
        }
        zip.finish().map_err(zip_err)?;

        let entries: Vec<String> = by_name.into_keys().collect();
        info!(
            "📦 压缩包已生成: {} (共 {} 个文件)",
            self.archive_path.display(),
            entries.len()
        );

        Ok(ArchiveBundle {
            path: self.archive_path.clone(),
            entries,
        })
    }
}

/// 列出目录下所有 PDF（按文件名排序）
pub fn scan_documents(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: dir.display().to_string(),
        }
        .into());
    }

    let mut documents = BTreeSet::new();
    for entry in std::fs::read_dir(dir)
        .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?
    {
        let path = entry?.path();
        let is_document = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
        if is_document {
            documents.insert(path);
        }
    }
    Ok(documents.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_manifest_archives_only_listed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let listed = dir.path().join("receipt-1.pdf");
        std::fs::write(&listed, b"%PDF-1.4 one").unwrap();
        std::fs::write(dir.path().join("receipt-OLD.pdf"), b"%PDF-1.4 old").unwrap();

        let builder = ArchiveBuilder::new(dir.path().join("robot-orders.zip"));
        let bundle = builder.build_from_manifest(&[listed.clone(), listed]).unwrap();

        assert_eq!(bundle.entries, vec!["receipt-1.pdf".to_string()]);
        assert_eq!(entry_names(&bundle.path), vec!["receipt-1.pdf".to_string()]);
    }

    #[test]
    fn test_directory_scan_includes_every_pdf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("receipt-2.pdf"), b"%PDF-1.4 two").unwrap();
        std::fs::write(dir.path().join("receipt-OLD.PDF"), b"%PDF-1.4 old").unwrap();
        std::fs::write(dir.path().join("robot-2.png"), b"png").unwrap();

        let builder = ArchiveBuilder::new(dir.path().join("robot-orders.zip"));
        let bundle = builder.build_from_directory(dir.path()).unwrap();

        assert_eq!(
            bundle.entries,
            vec!["receipt-2.pdf".to_string(), "receipt-OLD.PDF".to_string()]
        );
        assert_eq!(entry_names(&bundle.path), bundle.entries);
    }

    #[test]
    fn test_empty_manifest_produces_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ArchiveBuilder::new(dir.path().join("robot-orders.zip"));

        let bundle = builder.build_from_manifest(&[]).unwrap();

        assert!(bundle.entries.is_empty());
        assert!(entry_names(&bundle.path).is_empty());
    }

    #[test]
    fn test_scan_missing_directory() {
        let err = scan_documents(Path::new("/nonexistent/output")).unwrap_err();
        assert!(matches!(err, AppError::File(FileError::DirectoryNotFound { .. })));
    }
}
