use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

fn fmt_f64(v: f64) -> String {
    format!("{v:.10}")
}

fn fmt_opt(v: Option<usize>) -> String {
    match v {
        Some(x) => x.to_string(),
        None => "NA".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct UseCountRow {
    use_count: u32,
}

/// Read per-frame use counts from a CSV file with a `use_count` column.
pub fn read_use_counts(path: &Path) -> Result<Vec<u32>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open use counts: {}", path.display()))?;

    let mut counts = Vec::new();
    for (line, row) in rdr.deserialize::<UseCountRow>().enumerate() {
        let row =
            row.with_context(|| format!("bad use count on row {} of {}", line + 1, path.display()))?;
        counts.push(row.use_count);
    }
    Ok(counts)
}

fn pose_header(sensors: &[String]) -> Vec<String> {
    let mut header = vec![
        "frame".to_string(),
        "pose".to_string(),
        "src_frame".to_string(),
        "flip".to_string(),
        "shift".to_string(),
        "rotation".to_string(),
        "forward".to_string(),
    ];
    for sensor in sensors {
        header.push(format!("yaw_{sensor}"));
        header.push(format!("pitch_{sensor}"));
        header.push(format!("roll_{sensor}"));
    }
    header
}

fn pose_record(
    frame: Option<usize>,
    index: usize,
    pose: &Pose,
    sensors: &[String],
) -> Vec<String> {
    let mut record = vec![
        fmt_opt(frame),
        index.to_string(),
        fmt_opt(pose.src_frame),
        pose.flip.to_string(),
        fmt_f64(pose.shift),
        fmt_f64(pose.rotation),
        fmt_f64(pose.forward),
    ];
    for sensor in sensors {
        for map in [&pose.sensor_yaw, &pose.sensor_pitch, &pose.sensor_roll] {
            match map.get(sensor) {
                Some(&v) => record.push(fmt_f64(v)),
                None => record.push("NA".to_string()),
            }
        }
    }
    record
}

/// Write per-frame pose lists as CSV. `frame` is the trace frame and `pose`
/// the position of the pose inside that frame's list.
pub fn write_frames_csv<W: Write>(
    writer: W,
    frames: &[Vec<Pose>],
    sensors: &[String],
) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(pose_header(sensors))?;

    for (frame, poses) in frames.iter().enumerate() {
        for (index, pose) in poses.iter().enumerate() {
            wtr.write_record(pose_record(Some(frame), index, pose, sensors))?;
        }
    }

    wtr.flush().context("failed to flush poses")?;
    Ok(())
}

/// Write a flat pose sequence as CSV. Poses are no longer grouped by frame,
/// so `frame` is `NA` and `pose` is the position in the sequence.
pub fn write_poses_csv<'a, W, I>(writer: W, poses: I, sensors: &[String]) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Pose>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(pose_header(sensors))?;

    for (index, pose) in poses.into_iter().enumerate() {
        wtr.write_record(pose_record(None, index, pose, sensors))?;
    }

    wtr.flush().context("failed to flush poses")?;
    Ok(())
}

/// Write any serializable pose structure as pretty JSON.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("failed to serialize poses")?;
    writer.flush().context("failed to flush poses")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    fn pose() -> Pose {
        let angles: BTreeMap<String, f64> = [("center".to_string(), 0.25)].into_iter().collect();
        Pose {
            shift: -0.5,
            rotation: 1.0,
            forward: 0.0,
            sensor_yaw: angles.clone(),
            sensor_pitch: angles.clone(),
            sensor_roll: angles,
            flip: true,
            src_frame: Some(3),
        }
    }

    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn csv_has_one_column_per_sensor_angle() {
        let mut out = Vec::new();
        let sensors = vec!["center".to_string(), "pilot".to_string()];
        write_poses_csv(&mut out, &[pose()], &sensors).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "frame,pose,src_frame,flip,shift,rotation,forward,\
             yaw_center,pitch_center,roll_center,yaw_pilot,pitch_pilot,roll_pilot"
        );
        assert!(lines[1].starts_with("NA,0,3,true,-0.5000000000,1.0000000000,"));
        assert!(lines[1].ends_with(",NA,NA,NA"));
    }

    #[test]
    fn frame_csv_numbers_poses_within_each_frame() {
        let mut out = Vec::new();
        let sensors = vec!["center".to_string()];
        let frames = vec![vec![pose(), pose()], vec![], vec![pose()]];
        write_frames_csv(&mut out, &frames, &sensors).unwrap();

        let text = String::from_utf8(out).unwrap();
        let keys: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| &line[..line.match_indices(',').nth(1).unwrap().0])
            .collect();
        assert_eq!(keys, vec!["0,0", "0,1", "2,0"]);
    }

    #[test]
    fn failed_flush_is_reported() {
        let sensors = vec!["center".to_string()];
        assert!(write_json(FailingFlush(Vec::new()), &vec![pose()]).is_err());
        assert!(write_poses_csv(FailingFlush(Vec::new()), &[pose()], &sensors).is_err());
    }

    #[test]
    fn use_counts_are_read_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        fs::write(&path, "use_count\n2\n0\n 5 \n").unwrap();
        assert_eq!(read_use_counts(&path).unwrap(), vec![2, 0, 5]);
    }

    #[test]
    fn negative_use_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        fs::write(&path, "use_count\n-1\n").unwrap();
        assert!(read_use_counts(&path).is_err());
    }

    #[test]
    fn json_round_trips_poses() {
        let mut out = Vec::new();
        write_json(&mut out, &vec![pose()]).unwrap();
        let back: Vec<Pose> = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, vec![pose()]);
    }
}
