//! Simulated filesystem state, path resolution and operations

use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::node::{Directory, Node};
use crate::ops::{Deferred, FileSystem};
use crate::path::{self, Component};
use crate::types::{HandleId, Stats};

/// Open file handle: a copy of the payload taken at open time plus a cursor
#[derive(Debug)]
struct Handle {
    buffer: Vec<u8>,
    position: u64,
}

/// What the write resolver puts at the final path component
#[derive(Clone, Copy)]
enum WriteRequest<'a> {
    Directory,
    File(&'a [u8]),
    Symlink(&'a str),
}

/// In-memory filesystem owned by a single test.
///
/// The root is always a directory. Mutating operations take `&mut self`.
#[derive(Debug)]
pub struct MockFs {
    config: FsConfig,
    root: Node,
    handles: HashMap<HandleId, Handle>,
    next_handle_id: u64,
    mtime: i64,
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFs {
    pub fn new() -> Self {
        Self::with_config(FsConfig::default())
    }

    pub fn with_config(config: FsConfig) -> Self {
        Self {
            config,
            root: Node::dir(),
            handles: HashMap::new(),
            next_handle_id: 1,
            mtime: Self::current_timestamp(),
        }
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// Replace the whole tree. Open handles keep their copies.
    pub fn set_mock_filesystem(&mut self, root: Node) -> FsResult<()> {
        if !matches!(root, Node::Directory(_)) {
            return Err(FsError::not_a_directory("/"));
        }
        debug!(entries = root.as_dir().map_or(0, Directory::len), "installing mock filesystem");
        self.root = root;
        self.touch();
        Ok(())
    }

    pub fn get_mock_filesystem(&self) -> &Node {
        &self.root
    }

    fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }

    fn touch(&mut self) {
        self.mtime = Self::current_timestamp();
    }

    fn allocate_handle_id(&mut self) -> HandleId {
        let id = HandleId::new(self.next_handle_id);
        self.next_handle_id += 1;
        id
    }

    fn node_at(&self, components: &[String]) -> Option<&Node> {
        components
            .iter()
            .try_fold(&self.root, |node, name| node.as_dir()?.get(name))
    }

    fn node_at_mut(&mut self, components: &[String]) -> Option<&mut Node> {
        components
            .iter()
            .try_fold(&mut self.root, |node, name| node.as_dir_mut()?.get_mut(name))
    }

    fn dir_at_mut(&mut self, components: &[String], path: &str) -> FsResult<&mut Directory> {
        match self.node_at_mut(components) {
            Some(Node::Directory(dir)) => Ok(dir),
            Some(_) => Err(FsError::not_a_directory(path)),
            None => Err(FsError::not_found(path)),
        }
    }

    /// Components of a symlink target, resolved against the directory holding the link.
    fn link_components(&self, target: &str, link_parent: &[String]) -> Vec<Component> {
        let target = if self.config.strip_drive_prefix {
            path::strip_drive(target)
        } else {
            target
        };
        let mut components = Vec::new();
        if !path::is_absolute(target) {
            components.extend(link_parent.iter().cloned().map(Component::Normal));
        }
        components.extend(path::split(target));
        components
    }

    /// Walk `components` from the root and return the link-free path they name.
    ///
    /// Links met along the way are always followed; a trailing link only when
    /// `follow_last` is set.
    fn canonicalize(
        &self,
        path: &str,
        components: Vec<Component>,
        follow_last: bool,
    ) -> FsResult<Vec<String>> {
        let mut pending = VecDeque::from(components);
        let mut resolved: Vec<String> = Vec::new();
        let mut hops = 0;

        while let Some(component) = pending.pop_front() {
            let name = match component {
                Component::CurDir => continue,
                Component::ParentDir => {
                    resolved.pop();
                    continue;
                }
                Component::Normal(name) => name,
            };

            let dir = match self.node_at(&resolved) {
                Some(Node::Directory(dir)) => dir,
                Some(_) => return Err(FsError::not_a_directory(path)),
                None => return Err(FsError::not_found(path)),
            };

            match dir.get(&name) {
                None => {
                    trace!(path, missing = %name, "resolution failed");
                    return Err(FsError::not_found(path));
                }
                Some(Node::Symlink(target)) if follow_last || !pending.is_empty() => {
                    hops += 1;
                    if hops > self.config.limits.max_symlink_depth {
                        return Err(FsError::SymlinkLoop {
                            path: path.to_string(),
                        });
                    }
                    trace!(path, link = %name, target = %target, "following symlink");
                    let next = self.link_components(target, &resolved);
                    resolved.clear();
                    for component in next.into_iter().rev() {
                        pending.push_front(component);
                    }
                }
                Some(_) => resolved.push(name),
            }
        }

        trace!(path, resolved = ?resolved, "resolved");
        Ok(resolved)
    }

    fn resolve(&self, path: &str, follow_last: bool) -> FsResult<&Node> {
        let components = path::absolute_components(path, self.config.strip_drive_prefix)?;
        let resolved = self.canonicalize(path, components, follow_last)?;
        self.node_at(&resolved).ok_or_else(|| FsError::not_found(path))
    }

    /// Resolve the parent of `path` and return it with the final name.
    /// `None` means the path names the root.
    fn resolve_parent(
        &self,
        path: &str,
        mut components: Vec<Component>,
    ) -> FsResult<Option<(Vec<String>, String)>> {
        match components.pop() {
            None => Ok(None),
            Some(Component::Normal(name)) => {
                let parent = self.canonicalize(path, components, true)?;
                Ok(Some((parent, name)))
            }
            Some(_) => Err(FsError::InvalidArgument),
        }
    }

    fn write_node(&mut self, path: &str, request: WriteRequest<'_>) -> FsResult<()> {
        let components = path::absolute_components(path, self.config.strip_drive_prefix)?;
        let Some((parent, name)) = self.resolve_parent(path, components)? else {
            return Err(match request {
                WriteRequest::File(_) => FsError::is_a_directory(path),
                _ => FsError::already_exists(path),
            });
        };

        let dir = self.dir_at_mut(&parent, path)?;
        match request {
            // A file write replaces whatever node holds the name.
            WriteRequest::File(data) => {
                dir.insert(name, Node::file(data));
            }
            _ if dir.contains(&name) => return Err(FsError::already_exists(path)),
            WriteRequest::Directory => {
                dir.insert(name, Node::dir());
            }
            WriteRequest::Symlink(target) => {
                dir.insert(name, Node::symlink(target));
            }
        }

        self.touch();
        Ok(())
    }

    fn stats_for(&self, node: &Node) -> Stats {
        let len = match node {
            Node::Directory(_) => 0,
            Node::File(data) => data.len() as u64,
            Node::Symlink(target) => target.len() as u64,
        };
        Stats {
            kind: node.kind(),
            len,
            mtime: self.mtime,
        }
    }

    fn open_handle(&mut self, path: &str) -> FsResult<HandleId> {
        let buffer = match self.resolve(path, true)? {
            Node::File(data) => data.clone(),
            Node::Directory(_) => return Err(FsError::is_a_directory(path)),
            Node::Symlink(_) => return Err(FsError::not_found(path)),
        };
        if self.handles.len() >= self.config.limits.max_open_handles as usize {
            return Err(FsError::TooManyOpenFiles);
        }

        let id = self.allocate_handle_id();
        debug!(path, handle = ?id, len = buffer.len(), "opened handle");
        self.handles.insert(id, Handle { buffer, position: 0 });
        Ok(id)
    }

    fn read_handle(
        &mut self,
        id: HandleId,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<u64>,
    ) -> FsResult<usize> {
        let handle = self.handles.get_mut(&id).ok_or(FsError::InvalidArgument)?;
        if offset > buf.len() {
            return Err(FsError::InvalidArgument);
        }

        let start = position.unwrap_or(handle.position);
        let start = usize::try_from(start).map_err(|_| FsError::InvalidArgument)?;
        let available = handle.buffer.len().saturating_sub(start);
        let copied = length.min(buf.len() - offset).min(available);
        if copied > 0 {
            buf[offset..offset + copied].copy_from_slice(&handle.buffer[start..start + copied]);
        }
        handle.position = (start + copied) as u64;
        Ok(copied)
    }

    fn close_handle(&mut self, id: HandleId) -> FsResult<()> {
        self.handles.remove(&id).ok_or(FsError::InvalidArgument)?;
        debug!(handle = ?id, "closed handle");
        Ok(())
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path, true).is_ok()
    }

    pub fn read_link(&self, path: &str) -> FsResult<String> {
        match self.resolve(path, false)? {
            Node::Symlink(target) => Ok(target.clone()),
            _ => Err(FsError::InvalidArgument),
        }
    }

    pub fn read_to_string(&self, path: &str) -> FsResult<String> {
        String::from_utf8(self.read_file(path)?).map_err(|_| FsError::InvalidData)
    }

    /// Create a symlink at `link` pointing to `target`. The target need not exist.
    pub fn symlink(&mut self, target: &str, link: &str) -> FsResult<()> {
        self.write_node(link, WriteRequest::Symlink(target))?;
        debug!(link, target, "created symlink");
        Ok(())
    }

    /// Remove a file or symlink. A trailing symlink is removed, not followed.
    pub fn unlink(&mut self, path: &str) -> FsResult<()> {
        let components = path::absolute_components(path, self.config.strip_drive_prefix)?;
        let Some((parent, name)) = self.resolve_parent(path, components)? else {
            return Err(FsError::is_a_directory(path));
        };
        let dir = self.dir_at_mut(&parent, path)?;
        match dir.get(&name) {
            None => return Err(FsError::not_found(path)),
            Some(Node::Directory(_)) => return Err(FsError::is_a_directory(path)),
            Some(_) => {
                dir.remove(&name);
            }
        }
        debug!(path, "unlinked");
        self.touch();
        Ok(())
    }

    /// Remove an empty directory.
    pub fn rmdir(&mut self, path: &str) -> FsResult<()> {
        let components = path::absolute_components(path, self.config.strip_drive_prefix)?;
        let Some((parent, name)) = self.resolve_parent(path, components)? else {
            return Err(FsError::InvalidArgument);
        };
        let dir = self.dir_at_mut(&parent, path)?;
        match dir.get(&name) {
            None => return Err(FsError::not_found(path)),
            Some(Node::Directory(child)) if !child.is_empty() => {
                return Err(FsError::DirectoryNotEmpty {
                    path: path.to_string(),
                });
            }
            Some(Node::Directory(_)) => {
                dir.remove(&name);
            }
            Some(_) => return Err(FsError::not_a_directory(path)),
        }
        debug!(path, "removed directory");
        self.touch();
        Ok(())
    }
}

impl FileSystem for MockFs {
    fn realpath(&self, path: &str) -> FsResult<String> {
        match self.resolve(path, false)? {
            Node::Symlink(target) => Ok(target.clone()),
            _ => Ok(path.to_string()),
        }
    }

    fn readdir(&self, path: &str) -> FsResult<Vec<String>> {
        match self.resolve(path, true)? {
            Node::Directory(dir) => Ok(dir.names()),
            _ => Err(FsError::not_a_directory(path)),
        }
    }

    fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        match self.resolve(path, true)? {
            Node::File(data) => Ok(data.clone()),
            Node::Directory(_) => Err(FsError::is_a_directory(path)),
            Node::Symlink(_) => Err(FsError::not_found(path)),
        }
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> FsResult<()> {
        self.write_node(path, WriteRequest::File(data))?;
        debug!(path, len = data.len(), "wrote file");
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        self.write_node(path, WriteRequest::Directory)?;
        debug!(path, "created directory");
        Ok(())
    }

    fn stat(&self, path: &str) -> FsResult<Stats> {
        let node = self.resolve(path, true)?;
        Ok(self.stats_for(node))
    }

    fn lstat(&self, path: &str) -> FsResult<Stats> {
        let node = self.resolve(path, false)?;
        Ok(self.stats_for(node))
    }

    fn open(&mut self, path: &str) -> Deferred<FsResult<HandleId>> {
        Deferred::new(self.open_handle(path))
    }

    fn read(
        &mut self,
        handle: HandleId,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<u64>,
    ) -> Deferred<FsResult<usize>> {
        Deferred::new(self.read_handle(handle, buf, offset, length, position))
    }

    fn close(&mut self, handle: HandleId) -> Deferred<FsResult<()>> {
        Deferred::new(self.close_handle(handle))
    }
}
