use std::io;
use std::time::Duration;

use super::EventSource;

/// Upper bound on a wait while sources without a descriptor are in the set
const FDLESS_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Block until at least one source may have events, or `timeout` passes.
///
/// Returns the indices of sources worth reading. Sources without a descriptor
/// are always included, and their presence caps the wait at a few milliseconds.
/// An interrupted wait returns just those.
#[cfg(target_os = "linux")]
pub fn wait_for_readiness(
    sources: &[Box<dyn EventSource>],
    timeout: Duration,
) -> io::Result<Vec<usize>> {
    let mut indices = Vec::new();
    let mut pollfds = Vec::new();
    let mut ready = Vec::new();

    for (index, source) in sources.iter().enumerate() {
        match source.poll_fd() {
            Some(fd) => {
                indices.push(index);
                pollfds.push(libc::pollfd {
                    fd,
                    events: libc::POLLIN,
                    revents: 0,
                });
            }
            None => ready.push(index),
        }
    }

    let timeout = if ready.is_empty() {
        timeout
    } else {
        timeout.min(FDLESS_POLL_INTERVAL)
    };
    let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    let poll_result = unsafe {
        libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, timeout_ms)
    };

    if poll_result < 0 {
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
        return Ok(ready);
    }

    // Errors and hangups count as ready so the read surfaces them
    let wake = libc::POLLIN | libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;
    ready.extend(
        pollfds
            .iter()
            .zip(&indices)
            .filter(|(pollfd, _)| pollfd.revents & wake != 0)
            .map(|(_, &index)| index),
    );
    ready.sort_unstable();
    Ok(ready)
}

#[cfg(not(target_os = "linux"))]
pub fn wait_for_readiness(
    sources: &[Box<dyn EventSource>],
    timeout: Duration,
) -> io::Result<Vec<usize>> {
    std::thread::sleep(timeout.min(FDLESS_POLL_INTERVAL));
    Ok((0..sources.len()).collect())
}
