use std::fs;
use std::path::Path;

use coco2voc::coco::{Annotation, CocoFile, Image};
use coco2voc::dataset::convert_image_json;
use coco2voc::utils::create_output_directory;
use coco2voc::{
    build_document, convert_coco_index, filter_classes, inspect_dataset, post_process,
    post_process_all, process_json_dir, AnnotationStore, BBox, BoundingBox, CocoIndex,
    ConvertOptions, DetectionRecord, Error, UNIDENTIFIED,
};

fn image(id: u64, width: u32, height: u32) -> Image {
    Image {
        id,
        file_name: format!("{:012}.jpg", id),
        width,
        height,
    }
}

fn annotation(image_id: u64, category_id: u32, bbox: [f64; 4]) -> Annotation {
    Annotation::new(image_id, category_id, BBox::from(bbox))
}

fn options(output: &Path) -> ConvertOptions {
    ConvertOptions {
        output: output.to_path_buf(),
        ..ConvertOptions::default()
    }
}

fn write_document(store: &AnnotationStore, image_id: u64, boxes: &[(u32, [f64; 4])]) {
    let records: Vec<_> = boxes
        .iter()
        .map(|(category_id, bbox)| DetectionRecord::new(image_id, *category_id, BBox::from(*bbox)))
        .collect();
    let doc = build_document(image_id, &records, 640, 480).unwrap();
    store.write(&doc).unwrap();
}

#[test]
fn test_convert_coco_index_removes_unidentified() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = AnnotationStore::new(temp_dir.path());

    let coco = CocoFile {
        categories: Vec::new(),
        images: vec![image(1, 640, 480), image(2, 320, 240)],
        annotations: vec![
            annotation(1, 1, [10.0, 20.0, 30.0, 40.0]),
            annotation(1, 999, [1.0, 1.0, 1.0, 1.0]),
            annotation(1, 2, [0.0, 0.0, 5.0, 5.0]),
            annotation(2, 3, [5.0, 5.0, 10.0, 10.0]),
        ],
    };
    let index = CocoIndex::from_coco_file(coco);
    let stats = convert_coco_index(&index, &store, &options(temp_dir.path())).unwrap();

    assert_eq!(stats.total_groups, 2);
    assert_eq!(stats.written_documents, 2);
    assert_eq!(stats.unidentified_boxes, 1);
    assert_eq!(stats.removed_unidentified, 1);
    assert_eq!(stats.failed_documents, 0);

    assert_eq!(
        store.list().unwrap(),
        vec!["000000000001.xml".to_string(), "000000000002.xml".to_string()]
    );
    let first = store.read("000000000001.xml").unwrap();
    assert_eq!(first.filename, "000000000001.jpg");
    assert_eq!((first.width, first.height), (640, 480));
    assert_eq!(
        first.objects,
        vec![
            BoundingBox::new("person", 10, 20, 40, 60),
            BoundingBox::new("bicycle", 0, 0, 5, 5),
        ]
    );
    let second = store.read("000000000002.xml").unwrap();
    assert_eq!(second.objects, vec![BoundingBox::new("car", 5, 5, 15, 15)]);
}

#[test]
fn test_convert_skip_post_process_keeps_unidentified() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = AnnotationStore::new(temp_dir.path());
    let index = CocoIndex::from_coco_file(CocoFile {
        categories: Vec::new(),
        images: vec![image(3, 100, 100)],
        annotations: vec![annotation(3, 999, [1.0, 1.0, 2.0, 2.0])],
    });
    let options = ConvertOptions {
        skip_post_process: true,
        ..options(temp_dir.path())
    };

    let stats = convert_coco_index(&index, &store, &options).unwrap();
    assert_eq!(stats.removed_unidentified, 0);
    let doc = store.read("000000000003.xml").unwrap();
    assert_eq!(doc.count_class(UNIDENTIFIED), 1);
}

#[test]
fn test_convert_failure_is_per_document() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = AnnotationStore::new(temp_dir.path());
    let mut missing_bbox = annotation(2, 1, [0.0, 0.0, 1.0, 1.0]);
    missing_bbox.bbox = None;
    let index = CocoIndex::from_coco_file(CocoFile {
        categories: Vec::new(),
        // image 3 has no size entry
        images: vec![image(1, 100, 100), image(2, 100, 100)],
        annotations: vec![
            annotation(1, 1, [0.0, 0.0, 1.0, 1.0]),
            missing_bbox,
            annotation(3, 1, [0.0, 0.0, 1.0, 1.0]),
        ],
    });

    let stats = convert_coco_index(&index, &store, &options(temp_dir.path())).unwrap();
    assert_eq!(stats.written_documents, 1);
    assert_eq!(stats.failed_documents, 2);
    assert_eq!(store.list().unwrap(), vec!["000000000001.xml".to_string()]);

    let fail_fast = ConvertOptions {
        fail_fast: true,
        ..options(temp_dir.path())
    };
    let err = convert_coco_index(&index, &store, &fail_fast).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { image_id: 2, .. }));
}

#[test]
fn test_coco_index_load() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("instances_train2017.json");
    fs::write(
        &path,
        r#"{
            "info": {"year": 2017},
            "licenses": [],
            "categories": [{"id": 1, "name": "person", "supercategory": "person"}],
            "images": [{"id": 139, "file_name": "000000000139.jpg", "width": 640, "height": 426}],
            "annotations": [
                {"id": 1, "image_id": 139, "category_id": 1,
                 "bbox": [412.8, 157.61, 53.05, 138.01], "area": 2913.1, "iscrowd": 0}
            ]
        }"#,
    )
    .unwrap();

    let index = CocoIndex::load(&path).unwrap();
    assert_eq!(index.image_size(139), Some((640, 426)));
    assert_eq!(index.image_size(1), None);
    assert_eq!(index.categories().len(), 1);
    let record = DetectionRecord::try_from(&index.annotations()[0]).unwrap();
    assert_eq!(record.image_id, 139);
    assert_eq!(record.bbox, BBox::new(412.8, 157.61, 53.05, 138.01));

    let missing = temp_dir.path().join("missing.json");
    assert!(matches!(CocoIndex::load(&missing), Err(Error::Io { .. })));
}

#[test]
fn test_post_process_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = AnnotationStore::new(temp_dir.path());
    write_document(
        &store,
        7,
        &[
            (1, [0.0, 0.0, 1.0, 1.0]),
            (999, [1.0, 1.0, 1.0, 1.0]),
            (57, [2.0, 2.0, 1.0, 1.0]),
            (999, [3.0, 3.0, 1.0, 1.0]),
            (6, [4.0, 4.0, 1.0, 1.0]),
        ],
    );

    assert_eq!(post_process_all(&store).unwrap(), 2);
    let once = fs::read_to_string(store.path_of("000000000007.xml")).unwrap();
    assert_eq!(post_process_all(&store).unwrap(), 0);
    let twice = fs::read_to_string(store.path_of("000000000007.xml")).unwrap();
    assert_eq!(once, twice);

    let names: Vec<String> = store
        .read("000000000007.xml")
        .unwrap()
        .objects
        .into_iter()
        .map(|object| object.class_name)
        .collect();
    assert_eq!(names, vec!["person", "chair", "bus"]);
}

#[test]
fn test_post_process_missing_target() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = AnnotationStore::new(temp_dir.path());
    let err = post_process(&store, &["000000000001.xml".to_string()]).unwrap_err();
    assert!(matches!(err, Error::PostProcessTargetMissing { .. }));
}

#[test]
fn test_store_write_failure() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = AnnotationStore::new(temp_dir.path().join("does_not_exist"));
    let records = vec![DetectionRecord::new(1, 1, BBox::new(0.0, 0.0, 1.0, 1.0))];
    let doc = build_document(1, &records, 10, 10).unwrap();
    assert!(matches!(
        store.write(&doc),
        Err(Error::StorageWriteFailure { .. })
    ));
}

#[test]
fn test_process_json_dir() {
    let temp_dir = tempfile::tempdir().unwrap();
    let json_dir = temp_dir.path().join("Annotations");
    fs::create_dir_all(&json_dir).unwrap();
    fs::write(
        json_dir.join("000000000094.json"),
        r#"{
            "image": {"width": 640, "height": 480, "file_name": "000000000094.jpg"},
            "annotation": [
                {"image_id": 94, "category_id": 4, "bbox": [10.0, 10.0, 20.0, 20.0]},
                {"image_id": 94, "category_id": 90, "bbox": [0.0, 0.0, 1.0, 1.0]}
            ]
        }"#,
    )
    .unwrap();
    fs::write(
        json_dir.join("000000000095.json"),
        r#"{"image": {"width": 640, "height": 480}, "annotation": []}"#,
    )
    .unwrap();

    assert!(matches!(
        convert_image_json(&json_dir.join("000000000095.json")),
        Err(Error::EmptyAnnotation { .. })
    ));

    let output = temp_dir.path().join("coco_data");
    let stats = process_json_dir(&json_dir, &options(&output)).unwrap();
    assert_eq!(stats.total_groups, 2);
    assert_eq!(stats.written_documents, 1);
    assert_eq!(stats.failed_documents, 1);
    assert_eq!(stats.removed_unidentified, 1);

    let store = AnnotationStore::new(&output);
    let doc = store.read("000000000094.xml").unwrap();
    assert_eq!(doc.objects, vec![BoundingBox::new("motorcycle", 10, 10, 30, 30)]);
}

#[test]
fn test_filter_classes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let labels = temp_dir.path().join("labels");
    let images = temp_dir.path().join("images");
    fs::create_dir_all(&labels).unwrap();
    fs::create_dir_all(&images).unwrap();
    let store = AnnotationStore::new(&labels);

    write_document(&store, 1, &[(1, [0.0, 0.0, 1.0, 1.0]), (2, [1.0, 1.0, 1.0, 1.0])]);
    write_document(&store, 2, &[(2, [0.0, 0.0, 1.0, 1.0])]);
    write_document(&store, 3, &[(6, [0.0, 0.0, 1.0, 1.0])]);
    fs::write(images.join("000000000001.jpg"), b"jpg").unwrap();
    fs::write(images.join("000000000002.jpg"), b"jpg").unwrap();

    let classes = vec!["person".to_string(), "car".to_string()];
    let report = filter_classes(&store, &images, &classes).unwrap();

    assert_eq!(report.kept_documents, 1);
    assert_eq!(report.removed_documents, 2);
    assert_eq!(report.removed_objects, 3);
    assert_eq!(report.removed_images, 1);

    assert_eq!(store.list().unwrap(), vec!["000000000001.xml".to_string()]);
    assert_eq!(
        store.read("000000000001.xml").unwrap().objects,
        vec![BoundingBox::new("person", 0, 0, 1, 1)]
    );
    assert!(images.join("000000000001.jpg").exists());
    assert!(!images.join("000000000002.jpg").exists());
}

#[test]
fn test_inspect_dataset() {
    let temp_dir = tempfile::tempdir().unwrap();
    let pics = temp_dir.path().join("pics_labeled");
    let labels = temp_dir.path().join("labels");
    fs::create_dir_all(&pics).unwrap();
    fs::create_dir_all(&labels).unwrap();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        fs::write(pics.join(name), b"jpg").unwrap();
    }
    let store = AnnotationStore::new(&labels);
    write_document(&store, 1, &[(1, [0.0, 0.0, 1.0, 1.0]), (3, [0.0, 0.0, 1.0, 1.0])]);
    write_document(&store, 2, &[(1, [0.0, 0.0, 1.0, 1.0]), (2, [0.0, 0.0, 1.0, 1.0])]);

    let classes = vec!["person".to_string(), "car".to_string(), "bin".to_string()];
    let stats = inspect_dataset(&pics, &labels, &classes).unwrap();

    assert_eq!(stats.image_count, 3);
    assert_eq!(stats.label_count, 2);
    assert_eq!(
        stats.instances,
        vec![
            ("person".to_string(), 2),
            ("car".to_string(), 1),
            ("bin".to_string(), 0),
            ("bicycle".to_string(), 1),
        ]
    );
    assert_eq!(stats.instances_of("person"), 2);
    assert_eq!(stats.instances_of("bus"), 0);

    let missing = temp_dir.path().join("nope");
    assert!(matches!(
        inspect_dataset(&missing, &labels, &classes),
        Err(Error::MissingDirectory { .. })
    ));
}

#[test]
fn test_create_output_directory_clean() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("labels");
    let stale = out.join("000000000001.xml");

    assert_eq!(create_output_directory(&out, false).unwrap(), out);
    assert!(out.is_dir());
    fs::write(&stale, "<annotation/>").unwrap();

    create_output_directory(&out, false).unwrap();
    assert!(stale.exists());

    create_output_directory(&out, true).unwrap();
    assert!(out.is_dir());
    assert!(!stale.exists());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}
